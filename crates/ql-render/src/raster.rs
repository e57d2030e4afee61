//! Raster renderer built on plotters' bitmap backend
//!
//! Produces the chart snapshot used by image and document exports. Only
//! shapes are drawn; titles and tick labels belong to the interactive view.

use image::{Rgb, RgbImage};
use plotters::prelude::*;

use crate::geometry::{bar_slot, share_slices, slice_outline, DOUGHNUT_INNER_RATIO};
use crate::{ChartKind, ChartSpec, RenderError, Renderer, RendererCapabilities, ViewBounds};
use ql_core::Rgba;

/// Largest snapshot edge accepted
const MAX_DIMENSION: u32 = 8192;

/// Draws a [`ChartSpec`] into an RGB image
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    /// Visible area; `None` fits the data
    pub bounds: Option<ViewBounds>,
    pub background: Rgba,
    pub margin: u32,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self {
            bounds: None,
            background: [0xff, 0xff, 0xff, 0xff],
            margin: 16,
        }
    }
}

fn rgb(color: Rgba) -> RGBColor {
    RGBColor(color[0], color[1], color[2])
}

fn backend_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Backend(err.to_string())
}

impl RasterRenderer {
    /// Reproduce a view the user panned or zoomed to
    pub fn with_bounds(bounds: Option<ViewBounds>) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Render into a fresh `width` x `height` image
    pub fn snapshot(&mut self, chart: &ChartSpec, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::InvalidSize { width, height });
        }
        let mut image = RgbImage::from_pixel(width, height, Rgb([self.background[0], self.background[1], self.background[2]]));
        self.render(&mut image, chart)?;
        Ok(image)
    }

    fn view_bounds(&self, chart: &ChartSpec, width: u32, height: u32) -> ViewBounds {
        let bounds = self
            .bounds
            .filter(ViewBounds::is_valid)
            .unwrap_or_else(|| chart.data_bounds());
        if !chart.kind.is_share_of_whole() || self.bounds.is_some() {
            return bounds;
        }

        // Keep the pie round on non-square surfaces
        let aspect = width as f64 / height as f64;
        if aspect >= 1.0 {
            ViewBounds {
                min_x: bounds.min_x * aspect,
                max_x: bounds.max_x * aspect,
                ..bounds
            }
        } else {
            ViewBounds {
                min_y: bounds.min_y / aspect,
                max_y: bounds.max_y / aspect,
                ..bounds
            }
        }
    }
}

impl Renderer for RasterRenderer {
    type Surface = RgbImage;
    type Output = ();

    fn render(&mut self, surface: &mut RgbImage, chart: &ChartSpec) -> Result<(), RenderError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        if !chart.has_data() {
            return Err(RenderError::NoData);
        }

        let bounds = self.view_bounds(chart, width, height);
        tracing::debug!(
            "Rasterizing {:?} chart at {}x{} over x [{}, {}] y [{}, {}]",
            chart.kind,
            width,
            height,
            bounds.min_x,
            bounds.max_x,
            bounds.min_y,
            bounds.max_y
        );

        let root = BitMapBackend::with_buffer(&mut **surface, (width, height)).into_drawing_area();
        root.fill(&rgb(self.background)).map_err(backend_error)?;

        let mut plot = ChartBuilder::on(&root)
            .margin(self.margin)
            .build_cartesian_2d(bounds.min_x..bounds.max_x, bounds.min_y..bounds.max_y)
            .map_err(backend_error)?;

        match chart.kind {
            ChartKind::Pie | ChartKind::Doughnut => {
                let inner = if chart.kind == ChartKind::Doughnut {
                    DOUGHNUT_INNER_RATIO
                } else {
                    0.0
                };
                let Some(series) = chart.series.first() else {
                    return Err(RenderError::NoData);
                };
                let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
                let slices = share_slices(&values);
                plot.draw_series(slices.iter().map(|slice| {
                    let color = chart
                        .slice_colors
                        .get(slice.index)
                        .copied()
                        .unwrap_or(series.color);
                    let outline: Vec<(f64, f64)> = slice_outline(slice, inner)
                        .into_iter()
                        .map(|[x, y]| (x, y))
                        .collect();
                    Polygon::new(outline, rgb(color).filled())
                }))
                .map_err(backend_error)?;
            }
            kind => {
                let baseline = PathElement::new(vec![(bounds.min_x, 0.0), (bounds.max_x, 0.0)], BLACK.stroke_width(1));
                plot.draw_series(std::iter::once(baseline)).map_err(backend_error)?;

                let series_count = chart.series.len();
                for (index, series) in chart.series.iter().enumerate() {
                    let color = rgb(series.color);
                    match kind {
                        ChartKind::Bar => {
                            let slot = bar_slot(index, series_count);
                            plot.draw_series(series.points.iter().map(|p| {
                                let left = p.x + slot.offset - slot.width / 2.0;
                                let right = p.x + slot.offset + slot.width / 2.0;
                                Rectangle::new([(left, 0.0), (right, p.value)], color.filled())
                            }))
                            .map_err(backend_error)?;
                        }
                        ChartKind::Line => {
                            let path: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x, p.value)).collect();
                            plot.draw_series(std::iter::once(PathElement::new(path, color.stroke_width(2))))
                                .map_err(backend_error)?;
                            plot.draw_series(series.points.iter().map(|p| Circle::new((p.x, p.value), 3, color.filled())))
                                .map_err(backend_error)?;
                        }
                        _ => {
                            plot.draw_series(series.points.iter().map(|p| Circle::new((p.x, p.value), 4, color.filled())))
                                .map_err(backend_error)?;
                        }
                    }
                }
            }
        }

        root.present().map_err(backend_error)?;
        Ok(())
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            interactive: false,
            draws_text: false,
            max_dimension: Some(MAX_DIMENSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bar_chart;

    const WHITE_PIXEL: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);

    #[test]
    fn test_bar_is_drawn() {
        let chart = bar_chart(&[10.0]);
        let image = RasterRenderer::default().snapshot(&chart, 200, 100).unwrap();
        assert_eq!(image.dimensions(), (200, 100));
        assert_ne!(*image.get_pixel(100, 75), WHITE_PIXEL);
        assert_eq!(*image.get_pixel(2, 2), WHITE_PIXEL);
    }

    #[test]
    fn test_pie_fills_center() {
        let mut chart = bar_chart(&[5.0]);
        chart.kind = ChartKind::Pie;
        chart.slice_colors = vec![[0xef, 0x44, 0x44, 0xff]];
        let image = RasterRenderer::default().snapshot(&chart, 200, 100).unwrap();
        assert_ne!(*image.get_pixel(100, 50), WHITE_PIXEL);
    }

    #[test]
    fn test_doughnut_leaves_hole() {
        let mut chart = bar_chart(&[5.0]);
        chart.kind = ChartKind::Doughnut;
        let image = RasterRenderer::default().snapshot(&chart, 200, 200).unwrap();
        assert_eq!(*image.get_pixel(100, 100), WHITE_PIXEL);
    }

    #[test]
    fn test_empty_chart_is_rejected() {
        let chart = bar_chart(&[]);
        let err = RasterRenderer::default().snapshot(&chart, 10, 10).unwrap_err();
        assert!(matches!(err, RenderError::NoData));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let chart = bar_chart(&[1.0]);
        let err = RasterRenderer::default().snapshot(&chart, 0, 10).unwrap_err();
        assert!(matches!(err, RenderError::InvalidSize { width: 0, height: 10 }));
    }
}
