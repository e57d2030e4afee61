//! Interactive chart view backed by egui_plot

use egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotBounds, PlotPoints, Points, Polygon};
use ql_data::{VisualKind, VisualSpec};
use ql_render::{
    bar_slot, share_slices, slice_outline, ChartKind, ChartSpec, RenderError, Renderer, RendererCapabilities,
    ViewBounds, XScale, DOUGHNUT_INNER_RATIO,
};

use super::chart::ChartEngine;
use super::utils::{to_color32, with_alpha};
use crate::export::{run_export, ChartSnapshot, ExportArtifact};
use crate::{ResultView, ViewId, ViewerContext};

/// Chart kind for a visual, `None` for tables
pub fn chart_kind(kind: VisualKind) -> Option<ChartKind> {
    match kind {
        VisualKind::Table => None,
        VisualKind::Bar => Some(ChartKind::Bar),
        VisualKind::Line => Some(ChartKind::Line),
        VisualKind::Scatter => Some(ChartKind::Scatter),
        VisualKind::Pie => Some(ChartKind::Pie),
        VisualKind::Doughnut => Some(ChartKind::Doughnut),
    }
}

const PLOT_HEIGHT: f32 = 300.0;

/// Tick text at `val` on the x axis
fn x_tick(x_scale: XScale, categories: &[String], val: f64) -> String {
    match x_scale {
        XScale::Linear => format!("{}", (val * 1e6).round() / 1e6),
        XScale::Category => {
            let rounded = val.round();
            if (val - rounded).abs() > 1e-6 || rounded < 0.0 {
                return String::new();
            }
            categories.get(rounded as usize).cloned().unwrap_or_default()
        }
    }
}

/// Draws a [`ChartSpec`] into an egui_plot widget. Pan and zoom belong to
/// the widget; each pass reports the bounds it ended up showing.
pub struct PlotRenderer {
    plot_id: ViewId,
    pending_bounds: Option<ViewBounds>,
}

impl PlotRenderer {
    pub fn new(plot_id: ViewId) -> Self {
        Self {
            plot_id,
            pending_bounds: None,
        }
    }

    /// Move the view to `bounds` on the next pass
    pub fn request_bounds(&mut self, bounds: ViewBounds) {
        self.pending_bounds = Some(bounds);
    }

    fn draw_axis_series(plot_ui: &mut egui_plot::PlotUi, chart: &ChartSpec) {
        let series_count = chart.series.len();
        for (index, series) in chart.series.iter().enumerate() {
            let color = to_color32(series.color);
            let points: Vec<[f64; 2]> = series.points.iter().map(|p| [p.x, p.value]).collect();
            match chart.kind {
                ChartKind::Bar => {
                    let slot = bar_slot(index, series_count);
                    let bars = series
                        .points
                        .iter()
                        .map(|p| {
                            Bar::new(p.x + slot.offset, p.value)
                                .width(slot.width)
                                .name(&p.category)
                                .fill(color)
                        })
                        .collect();
                    plot_ui.bar_chart(BarChart::new(bars).color(color).name(&series.label));
                }
                ChartKind::Line => {
                    plot_ui.line(
                        Line::new(PlotPoints::from(points.clone()))
                            .color(color)
                            .width(2.0)
                            .name(&series.label),
                    );
                    plot_ui.points(Points::new(points).color(color).radius(3.0).name(&series.label));
                }
                _ => {
                    plot_ui.points(Points::new(points).color(color).radius(4.0).name(&series.label));
                }
            }
        }
    }

    fn draw_share_series(plot_ui: &mut egui_plot::PlotUi, chart: &ChartSpec) {
        let Some(series) = chart.series.first() else {
            return;
        };
        let inner = if chart.kind == ChartKind::Doughnut {
            DOUGHNUT_INNER_RATIO
        } else {
            0.0
        };
        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        for slice in share_slices(&values) {
            let color = chart.slice_colors.get(slice.index).copied().unwrap_or(series.color);
            let category = &series.points[slice.index].category;
            plot_ui.polygon(
                Polygon::new(PlotPoints::new(slice_outline(&slice, inner)))
                    .fill_color(with_alpha(color, 230))
                    .stroke(Stroke::new(1.0, Color32::WHITE))
                    .name(category),
            );
        }
    }
}

impl Renderer for PlotRenderer {
    type Surface = Ui;
    type Output = ViewBounds;

    fn render(&mut self, ui: &mut Ui, chart: &ChartSpec) -> Result<ViewBounds, RenderError> {
        if !chart.has_data() {
            return Err(RenderError::NoData);
        }

        let share = chart.kind.is_share_of_whole();
        let formatter = chart.formatter.clone();
        let mut plot = Plot::new(("chart", self.plot_id))
            .legend(Legend::default())
            .height(PLOT_HEIGHT)
            .allow_zoom(true)
            .allow_drag(true)
            .allow_boxed_zoom(true)
            .label_formatter(move |name, value| {
                if name.is_empty() {
                    String::new()
                } else if share {
                    name.to_string()
                } else {
                    format!("{}: {}", name, formatter.format_number(value.y))
                }
            });

        if share {
            plot = plot.data_aspect(1.0).show_axes([false, false]).show_grid(false);
        } else {
            let categories = chart.categories.clone();
            let x_scale = chart.x_scale;
            let y_formatter = chart.formatter.clone();
            plot = plot
                .x_axis_formatter(move |val, _chars, _range| x_tick(x_scale, &categories, val))
                .y_axis_formatter(move |val, _chars, _range| y_formatter.format_number(val));
            if let Some(x_label) = &chart.x_label {
                plot = plot.x_axis_label(x_label.clone());
            }
        }

        let pending = self.pending_bounds.take();
        let response = plot.show(ui, |plot_ui| {
            if let Some(b) = pending {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max([b.min_x, b.min_y], [b.max_x, b.max_y]));
            }
            if share {
                Self::draw_share_series(plot_ui, chart);
            } else {
                Self::draw_axis_series(plot_ui, chart);
            }
            plot_ui.plot_bounds()
        });

        let bounds = response.inner;
        Ok(ViewBounds {
            min_x: bounds.min()[0],
            max_x: bounds.max()[0],
            min_y: bounds.min()[1],
            max_y: bounds.max()[1],
        })
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            interactive: true,
            draws_text: true,
            max_dimension: None,
        }
    }
}

/// Chart card content: window controls, plot and image exports
pub struct ChartView {
    id: ViewId,
    title: String,
    engine: ChartEngine,
    renderer: PlotRenderer,
}

impl ChartView {
    /// Chart view for a chart visual; `None` for table visuals
    pub fn new(visual: &VisualSpec, ctx: &ql_core::RenderContext) -> Option<Self> {
        let kind = chart_kind(visual.kind)?;
        let engine = ChartEngine::new(&visual.data, kind, visual.x.as_deref(), visual.y.as_ref(), ctx);
        let id = ViewId::new_v4();
        Some(Self {
            id,
            title: engine.title().unwrap_or_default(),
            engine,
            renderer: PlotRenderer::new(id),
        })
    }

    pub fn engine(&self) -> &ChartEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ChartEngine {
        &mut self.engine
    }

    fn window_controls(&mut self, ui: &mut Ui) {
        let row_count = self.engine.row_count() as i64;
        let mut window = self.engine.window();
        ui.label("Start");
        ui.add(egui::DragValue::new(&mut window.start).clamp_range(0..=row_count.saturating_sub(1).max(0)));
        ui.label("End");
        ui.add(egui::DragValue::new(&mut window.end).clamp_range(0..=row_count));
        if window != self.engine.window() {
            self.engine.set_window(window);
        }
        if ui.small_button("All").on_hover_text("Show every row").clicked() {
            self.engine.reset_window();
        }
    }
}

impl ResultView for ChartView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn view_type(&self) -> &str {
        "ChartView"
    }

    fn has_data(&self) -> bool {
        self.engine.has_data()
    }

    fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui) {
        let Some(spec) = self.engine.spec(&ctx.render) else {
            ui.centered_and_justified(|ui| {
                ui.label("No chart data");
            });
            return;
        };

        ui.horizontal(|ui| {
            self.window_controls(ui);
            ui.separator();
            if ui.small_button("Reset zoom").clicked() {
                self.engine.reset_bounds();
                self.renderer.request_bounds(spec.data_bounds());
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let snapshot = ChartSnapshot {
                    chart: &spec,
                    bounds: self.engine.bounds(),
                };
                // run_export logs the outcome and publishes ExportFinished
                if ui.button("PDF").on_hover_text("Export chart as PDF").clicked() {
                    let _ = run_export(&ctx.events, ExportArtifact::ChartPdf, || ctx.exporter.pdf_image(&snapshot));
                }
                if ui.button("PNG").on_hover_text("Export chart as PNG").clicked() {
                    let _ = run_export(&ctx.events, ExportArtifact::ChartPng, || ctx.exporter.png_snapshot(&snapshot));
                }
            });
        });

        match self.renderer.render(ui, &spec) {
            Ok(bounds) => self.engine.observe_bounds(bounds),
            Err(RenderError::NoData) => {
                ui.label(RichText::new("No points in the selected window").weak());
            }
            Err(e) => {
                ui.colored_label(Color32::RED, e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x_ticks() {
        let categories = vec!["Ocak".to_string(), "Ocak".to_string(), "Mart".to_string()];
        assert_eq!(x_tick(XScale::Category, &categories, 1.0), "Ocak");
        assert_eq!(x_tick(XScale::Category, &categories, 2.0), "Mart");
        assert_eq!(x_tick(XScale::Category, &categories, 0.5), "");
        assert_eq!(x_tick(XScale::Category, &categories, 3.0), "");
        assert_eq!(x_tick(XScale::Linear, &categories, 2021.0), "2021");
        assert_eq!(x_tick(XScale::Linear, &categories, 2.5), "2.5");
    }

    #[test]
    fn test_chart_kind_mapping() {
        assert_eq!(chart_kind(VisualKind::Table), None);
        assert_eq!(chart_kind(VisualKind::Doughnut), Some(ChartKind::Doughnut));
        for kind in VisualKind::CHART_KINDS {
            assert!(chart_kind(kind).is_some());
        }
    }

    #[test]
    fn test_chart_view_only_for_charts() {
        let ctx = ql_core::RenderContext::default();
        let data = serde_json::from_value(serde_json::json!([{"ay": "Ocak", "satis": 1}])).unwrap();
        let table = VisualSpec::table(data);
        assert!(ChartView::new(&table, &ctx).is_none());

        let bar = VisualSpec {
            kind: VisualKind::Bar,
            x: Some("ay".into()),
            y: Some("satis".into()),
            ..table
        };
        let view = ChartView::new(&bar, &ctx).unwrap();
        assert_eq!(view.title(), "satis vs ay");
        assert!(view.has_data());
        assert!(view.renderer.capabilities().interactive);
    }
}
