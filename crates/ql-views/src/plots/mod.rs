//! Chart derivation and rendering

mod chart;
mod series;
pub mod utils;
mod view;

pub use chart::{build_chart, chart_title, ChartEngine, Window};
pub use series::{derive_series, resolve_y_columns, series_for_kind, Series, SeriesPoint, XAxis};
pub use view::{chart_kind, ChartView, PlotRenderer};
