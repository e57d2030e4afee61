//! View system for query results
//!
//! Table and chart engines plus the egui views that render them.

pub mod cards;
pub mod export;
pub mod plots;
mod result_view;
pub mod tables;

pub use cards::{arrange_cards, CardLayout, ResultCard, ResultCards};
pub use export::{
    run_export, ChartSnapshot, ExportAdapters, ExportArtifact, ExportError, ExportOutcome, FileExporter,
};
pub use plots::{build_chart, chart_title, derive_series, ChartEngine, ChartView, Series, SeriesPoint, Window, XAxis};
pub use result_view::{ResultView, ViewId};
pub use tables::{project, PageState, Projection, SortDirection, SortState, TableExport, TableState, TableView};

use std::sync::Arc;

use ql_core::{EventBus, RenderContext};

/// Context passed to views during rendering
#[derive(Clone)]
pub struct ViewerContext {
    /// Locale, unit aliases and palette
    pub render: RenderContext,

    /// Export capabilities
    pub exporter: Arc<dyn ExportAdapters>,

    /// Status events for the shell
    pub events: EventBus,
}

impl ViewerContext {
    pub fn new(render: RenderContext, exporter: Arc<dyn ExportAdapters>, events: EventBus) -> Self {
        Self {
            render,
            exporter,
            events,
        }
    }
}
