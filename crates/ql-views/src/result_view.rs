//! Result view abstraction - base trait for table and chart views

use egui::Ui;
use uuid::Uuid;

use crate::ViewerContext;

/// Unique identifier for a result view
pub type ViewId = Uuid;

/// Base trait for all result views (charts, tables)
pub trait ResultView {
    /// Get the unique ID of this view
    fn id(&self) -> ViewId;

    /// Get the title of this view
    fn title(&self) -> &str;

    /// Get the view type
    fn view_type(&self) -> &str;

    /// Whether the view has anything to show beyond an empty state
    fn has_data(&self) -> bool;

    /// Draw the UI
    fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui);
}
