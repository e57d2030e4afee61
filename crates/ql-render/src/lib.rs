//! Rendering abstraction layer
//!
//! The chart engine hands a [`ChartSpec`] to a [`Renderer`]. A spec is plain
//! data: windowed series, colors, title and a formatter. Renderers are the
//! only code that knows about a concrete drawing library.

pub mod geometry;
pub mod raster;

use ql_core::{Rgba, ValueFormatter};
use thiserror::Error;

pub use geometry::{bar_slot, share_slices, slice_outline, BarSlot, Slice, DOUGHNUT_INNER_RATIO};
pub use raster::RasterRenderer;

/// Chart kinds a renderer can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Pie,
    Doughnut,
}

impl ChartKind {
    /// Pie and doughnut show one series as shares of a whole
    pub fn is_share_of_whole(&self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Doughnut)
    }
}

/// How `ChartPoint::x` maps onto the horizontal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XScale {
    /// One slot per row; `categories[i]` sits at `x == i`
    #[default]
    Category,
    /// `x` is the row's own numeric x value
    Linear,
}

/// One plotted value
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Position on the x axis, see [`XScale`]
    pub x: f64,
    pub category: String,
    pub value: f64,
}

/// One series, already windowed
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub color: Rgba,
    pub points: Vec<ChartPoint>,
}

/// Renderer-ready chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub x_scale: XScale,
    /// Category axis labels, one per windowed row; `categories[i]` sits at
    /// `x == i` on a category scale
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    /// Per-category colors for share-of-whole kinds
    pub slice_colors: Vec<Rgba>,
    /// Tooltip and axis value text
    pub formatter: ValueFormatter,
}

impl ChartSpec {
    /// Whether any series has at least one point
    pub fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.points.is_empty())
    }

    /// Tooltip line for one value: `label: formatted`
    pub fn tooltip(&self, series: &ChartSeries, value: f64) -> String {
        format!("{}: {}", series.label, self.formatter.format_number(value))
    }

    /// Bounds enclosing every point, with room for bars and a zero baseline
    pub fn data_bounds(&self) -> ViewBounds {
        if self.kind.is_share_of_whole() {
            return ViewBounds::SHARE;
        }

        let mut min_y = 0.0_f64;
        let mut max_y = 0.0_f64;
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        for point in self.series.iter().flat_map(|s| s.points.iter()) {
            if point.value.is_finite() {
                min_y = min_y.min(point.value);
                max_y = max_y.max(point.value);
            }
            if point.x.is_finite() {
                min_x = min_x.min(point.x);
                max_x = max_x.max(point.x);
            }
        }
        if min_y == max_y {
            max_y = min_y + 1.0;
        }
        let pad = (max_y - min_y) * 0.05;

        let (min_x, max_x) = match self.x_scale {
            XScale::Category => (-0.5, (self.categories.len().max(1) as f64) - 0.5),
            XScale::Linear if min_x > max_x => (-0.5, 0.5),
            XScale::Linear => {
                let pad_x = ((max_x - min_x) * 0.05).max(0.5);
                (min_x - pad_x, max_x + pad_x)
            }
        };

        ViewBounds {
            min_x,
            max_x,
            min_y: if min_y < 0.0 { min_y - pad } else { min_y },
            max_y: max_y + pad,
        }
    }
}

/// Visible data-space rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ViewBounds {
    /// Unit square around the origin, used for pie and doughnut
    pub const SHARE: ViewBounds = ViewBounds {
        min_x: -1.2,
        max_x: 1.2,
        min_y: -1.2,
        max_y: 1.2,
    };

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Non-empty, finite rectangle
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }
}

/// Errors raised while drawing a chart
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("chart has no data")]
    NoData,

    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("drawing backend error: {0}")]
    Backend(String),
}

/// Trait for renderers
pub trait Renderer {
    /// What the renderer draws onto
    type Surface: ?Sized;

    /// What a render pass reports back
    type Output;

    /// Draw `chart` onto `surface`
    fn render(&mut self, surface: &mut Self::Surface, chart: &ChartSpec) -> Result<Self::Output, RenderError>;

    /// Get renderer capabilities
    fn capabilities(&self) -> RendererCapabilities;
}

/// Renderer capabilities
#[derive(Debug, Clone)]
pub struct RendererCapabilities {
    /// Supports pan and zoom driven by the user
    pub interactive: bool,
    /// Draws text (titles, ticks, legend)
    pub draws_text: bool,
    /// Largest surface edge in pixels, if bounded
    pub max_dimension: Option<u32>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn bar_chart(values: &[f64]) -> ChartSpec {
        let categories: Vec<String> = (0..values.len()).map(|i| format!("c{}", i)).collect();
        ChartSpec {
            kind: ChartKind::Bar,
            title: Some("v vs c".to_string()),
            x_label: Some("c".to_string()),
            x_scale: XScale::Category,
            series: vec![ChartSeries {
                label: "v".to_string(),
                color: [0x3b, 0x82, 0xf6, 0xff],
                points: values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| ChartPoint {
                        x: i as f64,
                        category: categories[i].clone(),
                        value: *v,
                    })
                    .collect(),
            }],
            categories,
            slice_colors: Vec::new(),
            formatter: ValueFormatter::default(),
        }
    }
}
