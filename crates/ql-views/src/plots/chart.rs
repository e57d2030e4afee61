//! Chart engine: windowing, colors and titles over derived series
//!
//! Chart state is plain data. [`ChartEngine`] owns `(series, window)` and
//! the last pan/zoom bounds a renderer reported; [`build_chart`] turns that
//! into a [`ChartSpec`] deterministically.

use std::ops::Range;

use ql_core::{Record, RenderContext, ValueFormatter};
use ql_data::YSpec;
use ql_render::{ChartKind, ChartPoint, ChartSeries, ChartSpec, ViewBounds, XScale};

use super::series::{derive_series, series_for_kind, Series, XAxis};

/// Discrete display range over batch rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    /// Whole batch
    pub fn full(row_count: usize) -> Self {
        Self {
            start: 0,
            end: row_count as i64,
        }
    }

    /// Clamp both ends to `[0, row_count]`, pulling `start` down to `end`
    /// when they cross
    pub fn clamp(&self, row_count: usize) -> Range<usize> {
        let limit = row_count as i64;
        let end = self.end.clamp(0, limit);
        let start = self.start.clamp(0, limit).min(end);
        start as usize..end as usize
    }
}

/// `"<y1, y2> vs <x>"`, when there is a series and an x column
pub fn chart_title(series: &[Series], x_column: Option<&str>) -> Option<String> {
    let x = x_column.filter(|x| !x.is_empty())?;
    if series.is_empty() {
        return None;
    }
    let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
    Some(format!("{} vs {}", labels.join(", "), x))
}

/// Build a renderer-ready chart over the rows in `window`.
///
/// Every windowed row gets one category slot, repeated x values included.
/// Scatter charts whose first x value is a number plot on a linear axis
/// instead. `None` means there is nothing to chart.
pub fn build_chart(
    series: &[Series],
    kind: ChartKind,
    window: Range<usize>,
    axis: &XAxis,
    context: &RenderContext,
    formatter: &ValueFormatter,
) -> Option<ChartSpec> {
    if series.is_empty() {
        tracing::debug!("No chart data for {:?} chart", kind);
        return None;
    }
    let share = kind.is_share_of_whole();
    let plotted = if share { &series[..1] } else { series };
    let x_scale = if kind == ChartKind::Scatter && axis.numbers.is_some() {
        XScale::Linear
    } else {
        XScale::Category
    };

    let chart_series: Vec<ChartSeries> = plotted
        .iter()
        .enumerate()
        .map(|(index, s)| ChartSeries {
            label: s.label.clone(),
            color: context.color(index),
            points: s
                .points
                .iter()
                .filter(|p| window.contains(&p.row))
                .enumerate()
                .filter_map(|(offset, p)| {
                    let x = match x_scale {
                        _ if share => offset as f64,
                        XScale::Category => (p.row - window.start) as f64,
                        XScale::Linear => axis.number(p.row)?,
                    };
                    Some(ChartPoint {
                        x,
                        category: p.category.clone(),
                        value: p.value,
                    })
                })
                .collect(),
        })
        .collect();

    let categories: Vec<String> = if share {
        chart_series
            .first()
            .map(|s| s.points.iter().map(|p| p.category.clone()).collect())
            .unwrap_or_default()
    } else {
        window
            .clone()
            .map(|row| axis.labels.get(row).cloned().unwrap_or_default())
            .collect()
    };

    let slice_colors = if share {
        (0..categories.len()).map(|i| context.color(i)).collect()
    } else {
        Vec::new()
    };

    Some(ChartSpec {
        kind,
        title: chart_title(plotted, axis.column.as_deref()),
        x_label: axis.column.clone(),
        x_scale,
        categories,
        series: chart_series,
        slice_colors,
        formatter: formatter.clone(),
    })
}

/// Owns the chart state of one visual
#[derive(Debug, Clone)]
pub struct ChartEngine {
    kind: ChartKind,
    axis: XAxis,
    series: Vec<Series>,
    row_count: usize,
    window: Window,
    formatter: ValueFormatter,
    bounds: Option<ViewBounds>,
}

impl ChartEngine {
    pub fn new(
        batch: &[Record],
        kind: ChartKind,
        x_column: Option<&str>,
        y: Option<&YSpec>,
        context: &RenderContext,
    ) -> Self {
        let series = series_for_kind(derive_series(batch, x_column, y), kind);
        tracing::info!(
            "{:?} chart over {} rows with {} series",
            kind,
            batch.len(),
            series.len()
        );
        Self {
            kind,
            axis: XAxis::from_batch(batch, x_column),
            series,
            row_count: batch.len(),
            window: Window::full(batch.len()),
            formatter: context.formatter_for(batch),
            bounds: None,
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }

    pub fn formatter(&self) -> &ValueFormatter {
        &self.formatter
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn set_window(&mut self, window: Window) {
        let clamped = window.clamp(self.row_count);
        if clamped.start as i64 != window.start || clamped.end as i64 != window.end {
            tracing::debug!("Window {:?} clamped to {:?}", window, clamped);
        }
        self.window = Window {
            start: clamped.start as i64,
            end: clamped.end as i64,
        };
    }

    pub fn reset_window(&mut self) {
        self.window = Window::full(self.row_count);
    }

    /// Record the pan/zoom bounds the renderer last showed
    pub fn observe_bounds(&mut self, bounds: ViewBounds) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<ViewBounds> {
        self.bounds
    }

    pub fn reset_bounds(&mut self) {
        self.bounds = None;
    }

    pub fn title(&self) -> Option<String> {
        let plotted = if self.kind.is_share_of_whole() {
            &self.series[..self.series.len().min(1)]
        } else {
            &self.series[..]
        };
        chart_title(plotted, self.axis.column.as_deref())
    }

    /// Current chart, windowed
    pub fn spec(&self, context: &RenderContext) -> Option<ChartSpec> {
        build_chart(
            &self.series,
            self.kind,
            self.window.clamp(self.row_count),
            &self.axis,
            context,
            &self.formatter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::series::SeriesPoint;
    use serde_json::{json, Value};

    fn batch(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    fn series(label: &str, values: &[f64]) -> Series {
        Series {
            label: label.into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    row: i,
                    category: format!("c{}", i),
                    value: *v,
                })
                .collect(),
        }
    }

    fn axis(rows: usize) -> XAxis {
        XAxis {
            column: Some("c".into()),
            labels: (0..rows).map(|i| format!("c{}", i)).collect(),
            numbers: None,
        }
    }

    #[test]
    fn test_window_clamping() {
        assert_eq!(Window { start: -3, end: 2 }.clamp(5), 0..2);
        assert_eq!(Window { start: 1, end: 99 }.clamp(5), 1..5);
        assert_eq!(Window { start: 4, end: 2 }.clamp(5), 2..2);
        assert_eq!(Window::full(0).clamp(0), 0..0);
    }

    #[test]
    fn test_window_keeps_exact_indices() {
        let all = vec![series("a", &[1.0, 2.0, 3.0, 4.0]), series("b", &[5.0, 6.0, 7.0, 8.0])];
        let ctx = RenderContext::default();
        let spec = build_chart(
            &all,
            ChartKind::Line,
            Window { start: 1, end: 3 }.clamp(4),
            &axis(4),
            &ctx,
            &ValueFormatter::default(),
        )
        .unwrap();

        for (chart_series, values) in spec.series.iter().zip([[2.0, 3.0], [6.0, 7.0]]) {
            let got: Vec<f64> = chart_series.points.iter().map(|p| p.value).collect();
            assert_eq!(got, values);
        }
        assert_eq!(spec.categories, vec!["c1", "c2"]);
        assert_eq!(spec.series[0].points[0].x, 0.0);
        assert_eq!(spec.title.as_deref(), Some("a, b vs c"));

        let from_negative = build_chart(
            &all,
            ChartKind::Bar,
            Window { start: -1, end: 2 }.clamp(4),
            &axis(4),
            &ctx,
            &ValueFormatter::default(),
        )
        .unwrap();
        assert_eq!(from_negative.series[0].points[0].value, 1.0);
    }

    #[test]
    fn test_colors_cycle_through_palette() {
        let ctx = RenderContext {
            palette: vec![[1, 1, 1, 255], [2, 2, 2, 255]],
            ..RenderContext::default()
        };
        let all: Vec<Series> = (0..3).map(|i| series(&format!("s{}", i), &[1.0])).collect();
        let spec = build_chart(&all, ChartKind::Bar, 0..1, &axis(1), &ctx, &ValueFormatter::default()).unwrap();
        let colors: Vec<[u8; 4]> = spec.series.iter().map(|s| s.color).collect();
        assert_eq!(colors, vec![[1, 1, 1, 255], [2, 2, 2, 255], [1, 1, 1, 255]]);
    }

    #[test]
    fn test_share_kinds_color_by_category() {
        let all = vec![series("a", &[1.0, 2.0, 3.0]), series("b", &[1.0])];
        let ctx = RenderContext::default();
        let spec = build_chart(&all, ChartKind::Doughnut, 0..3, &axis(3), &ctx, &ValueFormatter::default()).unwrap();
        assert_eq!(spec.series.len(), 1);
        assert_eq!(spec.slice_colors, vec![ctx.color(0), ctx.color(1), ctx.color(2)]);
        assert_eq!(spec.title.as_deref(), Some("a vs c"));
    }

    #[test]
    fn test_no_series_means_no_chart() {
        let ctx = RenderContext::default();
        assert!(build_chart(&[], ChartKind::Pie, 0..0, &axis(0), &ctx, &ValueFormatter::default()).is_none());
        assert_eq!(chart_title(&[series("a", &[1.0])], None), None);
        assert_eq!(chart_title(&[series("a", &[1.0])], Some("")), None);
    }

    #[test]
    fn test_window_selects_rows_not_point_positions() {
        let rows = batch(json!([
            {"r": "r0", "a": 0, "b": 10},
            {"r": "r1", "a": 1, "b": "11"},
            {"r": "r2", "a": 2, "b": 12},
            {"r": "r3", "a": 3, "b": 13}
        ]));
        let ctx = RenderContext::default();
        let mut engine = ChartEngine::new(&rows, ChartKind::Line, Some("r"), Some(&YSpec::from("a, b")), &ctx);
        engine.set_window(Window { start: 1, end: 3 });
        let spec = engine.spec(&ctx).unwrap();

        assert_eq!(spec.categories, vec!["r1", "r2"]);
        let a: Vec<(f64, &str)> = spec.series[0].points.iter().map(|p| (p.x, p.category.as_str())).collect();
        let b: Vec<(f64, &str)> = spec.series[1].points.iter().map(|p| (p.x, p.category.as_str())).collect();
        assert_eq!(a, vec![(0.0, "r1"), (1.0, "r2")]);
        assert_eq!(b, vec![(1.0, "r2")]);
    }

    #[test]
    fn test_repeated_x_values_keep_their_own_slot() {
        let rows = batch(json!([
            {"m": "Ocak", "v": 1},
            {"m": "Ocak", "v": 2},
            {"m": "Mart", "v": 3}
        ]));
        let ctx = RenderContext::default();
        let spec = ChartEngine::new(&rows, ChartKind::Bar, Some("m"), None, &ctx)
            .spec(&ctx)
            .unwrap();
        assert_eq!(spec.categories, vec!["Ocak", "Ocak", "Mart"]);
        let xs: Vec<f64> = spec.series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert_eq!(spec.x_scale, XScale::Category);
    }

    #[test]
    fn test_scatter_uses_numeric_x_values() {
        let rows = batch(json!([
            {"yas": 30, "maas": 100},
            {"yas": 25, "maas": 80},
            {"yas": "?", "maas": 90},
            {"yas": 41, "maas": 120}
        ]));
        let ctx = RenderContext::default();
        let spec = ChartEngine::new(&rows, ChartKind::Scatter, Some("yas"), None, &ctx)
            .spec(&ctx)
            .unwrap();
        assert_eq!(spec.x_scale, XScale::Linear);
        let points: Vec<(f64, f64)> = spec.series[0].points.iter().map(|p| (p.x, p.value)).collect();
        assert_eq!(points, vec![(30.0, 100.0), (25.0, 80.0), (41.0, 120.0)]);

        let bars = ChartEngine::new(&rows, ChartKind::Bar, Some("yas"), None, &ctx)
            .spec(&ctx)
            .unwrap();
        assert_eq!(bars.x_scale, XScale::Category);
        assert_eq!(bars.series[0].points[1].x, 1.0);

        let labels = batch(json!([{"ay": "Ocak", "v": 1}, {"ay": "Şubat", "v": 2}]));
        let categorical = ChartEngine::new(&labels, ChartKind::Scatter, Some("ay"), None, &ctx)
            .spec(&ctx)
            .unwrap();
        assert_eq!(categorical.x_scale, XScale::Category);
        assert_eq!(categorical.series[0].points[1].x, 1.0);
    }

    #[test]
    fn test_engine_formats_with_unit() {
        let rows = batch(json!([
            {"ay": "Ocak", "tutar": 1234.5, "birim": "TL"},
            {"ay": "Şubat", "tutar": -20, "birim": "TL"}
        ]));
        let ctx = RenderContext::default();
        let mut engine = ChartEngine::new(&rows, ChartKind::Bar, Some("ay"), None, &ctx);
        let spec = engine.spec(&ctx).unwrap();
        assert_eq!(spec.formatter.format_number(1234.5), "1.234,50 TL");
        assert_eq!(engine.title().as_deref(), Some("tutar vs ay"));

        engine.set_window(Window { start: -5, end: 1 });
        assert_eq!(engine.window(), Window { start: 0, end: 1 });
        assert_eq!(engine.spec(&ctx).unwrap().series[0].points.len(), 1);
    }
}
