//! Table view implementation

use egui::{RichText, ScrollArea, Ui};
use ql_core::{cell, infer_columns, value_sign, Column, Record, RenderContext, ValueFormatter};

use super::{Projection, SortDirection, TableExport, TableState};
use crate::export::{run_export, ExportArtifact};
use crate::plots::utils::sign_color;
use crate::{ResultView, ViewId, ViewerContext};

/// Configuration for table views
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub show_row_numbers: bool,
    pub sortable_columns: bool,
    pub resizable_columns: bool,
    pub striped_rows: bool,
    /// Color numeric cells by sign
    pub sign_colors: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            show_row_numbers: false,
            sortable_columns: true,
            resizable_columns: true,
            striped_rows: true,
            sign_colors: true,
        }
    }
}

/// Interaction collected while drawing, applied once the table is done
#[derive(Default)]
struct PendingInput {
    sort: Option<String>,
    toggled_rows: Vec<usize>,
    toggle_page: bool,
}

/// Paged, sortable, filterable table over one record batch
pub struct TableView {
    id: ViewId,
    title: String,
    pub config: TableConfig,

    batch: Vec<Record>,
    columns: Vec<Column>,
    formatter: ValueFormatter,
    state: TableState,
}

impl TableView {
    pub fn new(title: impl Into<String>, batch: Vec<Record>, context: &RenderContext, page_size: usize) -> Self {
        let columns = infer_columns(&batch);
        tracing::debug!("Table with {} rows and {} columns", batch.len(), columns.len());
        Self {
            id: ViewId::new_v4(),
            title: title.into(),
            config: TableConfig::default(),
            formatter: context.formatter_for(&batch),
            columns,
            batch,
            state: TableState::new(page_size),
        }
    }

    /// Replace the batch; sort, filter, selection and page start over
    pub fn set_batch(&mut self, batch: Vec<Record>, context: &RenderContext) {
        self.columns = infer_columns(&batch);
        self.formatter = context.formatter_for(&batch);
        self.batch = batch;
        self.state.reset_for_batch();
    }

    pub fn batch(&self) -> &[Record] {
        &self.batch
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }

    /// Current page, after clamping the page index
    pub fn projection(&mut self) -> Projection {
        self.state.project(&self.batch, &self.columns)
    }

    /// Rows and columns the table exports write
    pub fn export_projection(&self) -> TableExport<'_> {
        self.state.export_projection(&self.batch, &self.columns)
    }

    fn cell_text(&self, record: &Record, column: &str) -> RichText {
        let value = cell(record, column);
        let text = RichText::new(self.formatter.format(value));
        match sign_color(value_sign(value)) {
            Some(color) if self.config.sign_colors => text.color(color),
            _ => text,
        }
    }

    fn toolbar(&mut self, ctx: &ViewerContext, ui: &mut Ui, projection: &Projection) {
        ui.horizontal(|ui| {
            let mut filter = self.state.filter().to_string();
            let response = ui.add(
                egui::TextEdit::singleline(&mut filter)
                    .hint_text("Search...")
                    .desired_width(180.0),
            );
            if response.changed() {
                self.state.set_filter(filter);
            }

            ui.separator();
            ui.label(format!("Rows: {}", projection.row_count));
            let selected = self.state.selected().len();
            if selected > 0 {
                ui.separator();
                ui.label(format!("Selected: {}", selected));
                if ui.small_button("Clear").clicked() {
                    self.state.clear_selection();
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let export = self.export_projection();
                // run_export logs the outcome and publishes ExportFinished
                if ui.button("PDF").on_hover_text("Export table as PDF").clicked() {
                    let _ = run_export(&ctx.events, ExportArtifact::TablePdf, || ctx.exporter.pdf_table(&export));
                }
                if ui.button("Excel").on_hover_text("Export table as XLSX").clicked() {
                    let _ = run_export(&ctx.events, ExportArtifact::TableSpreadsheet, || {
                        ctx.exporter.spreadsheet(&export)
                    });
                }
                if ui.button("CSV").on_hover_text("Export table as CSV").clicked() {
                    let _ = run_export(&ctx.events, ExportArtifact::TableCsv, || ctx.exporter.csv(&export));
                }
            });
        });
    }

    fn render_table(&self, ui: &mut Ui, projection: &Projection) -> PendingInput {
        use egui_extras::{Column as TableColumn, TableBuilder};

        let mut pending = PendingInput::default();
        let text_height = egui::TextStyle::Body.resolve(ui.style()).size + 6.0;

        let mut builder = TableBuilder::new(ui)
            .striped(self.config.striped_rows)
            .resizable(self.config.resizable_columns)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .min_scrolled_height(0.0)
            .vscroll(false);

        builder = builder.column(TableColumn::exact(24.0));
        if self.config.show_row_numbers {
            builder = builder.column(TableColumn::initial(50.0).at_least(40.0));
        }
        for _ in &self.columns {
            builder = builder.column(
                TableColumn::initial(150.0)
                    .at_least(80.0)
                    .at_most(400.0)
                    .clip(true)
                    .resizable(self.config.resizable_columns),
            );
        }

        builder
            .header(20.0, |mut header| {
                header.col(|ui| {
                    let mut all = self.state.page_selected(projection);
                    if ui.checkbox(&mut all, "").on_hover_text("Select page").changed() {
                        pending.toggle_page = true;
                    }
                });
                if self.config.show_row_numbers {
                    header.col(|ui| {
                        ui.strong("#");
                    });
                }
                for column in &self.columns {
                    header.col(|ui| {
                        let arrow = match self.state.sort() {
                            Some(sort) if sort.column == column.name => match sort.direction {
                                SortDirection::Ascending => " ▲",
                                SortDirection::Descending => " ▼",
                            },
                            _ => "",
                        };
                        let label = RichText::new(format!("{}{}", column.name, arrow)).strong();
                        if self.config.sortable_columns {
                            if ui.add(egui::Button::new(label).frame(false)).clicked() {
                                pending.sort = Some(column.name.clone());
                            }
                        } else {
                            ui.label(label);
                        }
                    });
                }
            })
            .body(|body| {
                body.rows(text_height, projection.visible_rows.len(), |row_index, mut row| {
                    let visible = projection.visible_rows[row_index];
                    let record = &self.batch[visible.source_index];

                    row.col(|ui| {
                        let mut checked = self.state.is_selected(visible.view_index);
                        if ui.checkbox(&mut checked, "").changed() {
                            pending.toggled_rows.push(visible.view_index);
                        }
                    });
                    if self.config.show_row_numbers {
                        row.col(|ui| {
                            ui.label(RichText::new(format!("{}", visible.view_index + 1)).weak());
                        });
                    }
                    for column in &self.columns {
                        row.col(|ui| {
                            ui.label(self.cell_text(record, &column.name));
                        });
                    }
                });
            });

        pending
    }

    fn pager(&mut self, ui: &mut Ui, projection: &Projection) {
        ui.horizontal(|ui| {
            let at_start = projection.page_index == 0;
            let at_end = projection.page_index + 1 >= projection.page_count;
            if ui.add_enabled(!at_start, egui::Button::new("◀")).clicked() {
                self.state.previous_page();
            }
            ui.label(format!("Page {} of {}", projection.page_index + 1, projection.page_count));
            if ui.add_enabled(!at_end, egui::Button::new("▶")).clicked() {
                self.state.next_page(projection.page_count);
            }
        });
    }

    fn apply(&mut self, pending: PendingInput, projection: &Projection) {
        if let Some(column) = pending.sort {
            self.state.toggle_sort(&column);
        }
        for view_index in pending.toggled_rows {
            self.state.toggle_row(view_index);
        }
        if pending.toggle_page {
            self.state.toggle_page(projection);
        }
    }
}

impl ResultView for TableView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn view_type(&self) -> &str {
        "TableView"
    }

    fn has_data(&self) -> bool {
        !self.columns.is_empty()
    }

    fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui) {
        if self.columns.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label("No results");
            });
            return;
        }

        let projection = self.projection();
        self.toolbar(ctx, ui, &projection);
        ui.add_space(4.0);

        let pending = ScrollArea::horizontal()
            .id_source(format!("table_{:?}", self.id))
            .show(ui, |ui| self.render_table(ui, &projection))
            .inner;

        if projection.visible_rows.is_empty() {
            ui.label(RichText::new("No rows match the filter").weak());
        }
        self.pager(ui, &projection);
        self.apply(pending, &projection);
    }
}
