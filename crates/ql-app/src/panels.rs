//! Side panels: result history, recent questions and the schema field picker

use eframe::egui::{self, RichText, Ui};
use ql_data::filter_schema;

use crate::app::QueryLensApp;

pub fn history_panel(app: &mut QueryLensApp, ui: &mut Ui) {
    ui.heading("History");
    ui.separator();

    let mut show = None;
    if app.history().is_empty() {
        ui.label(RichText::new("No answers yet").weak());
    }
    for (index, entry) in app.history().iter().enumerate() {
        let selected = app.shown_history() == Some(index);
        let label = format!("{}  {}", entry.answered_at.format("%H:%M:%S"), entry.question);
        if ui
            .selectable_label(selected, label)
            .on_hover_text(&entry.response.sql)
            .clicked()
        {
            show = Some(index);
        }
    }
    if let Some(index) = show {
        app.show_history(index);
    }

    ui.add_space(12.0);
    ui.horizontal(|ui| {
        ui.strong("Recent questions");
        if !app.recent().questions().is_empty() && ui.small_button("Clear").clicked() {
            app.clear_recent();
        }
    });
    ui.separator();

    let mut chosen = None;
    for question in app.recent().questions() {
        if ui.link(question).clicked() {
            chosen = Some(question.clone());
        }
    }
    if let Some(question) = chosen {
        app.use_recent(question);
    }
}

pub fn schema_panel(app: &mut QueryLensApp, ui: &mut Ui) {
    ui.heading("Fields");
    ui.add(egui::TextEdit::singleline(app.schema_filter_mut()).hint_text("Filter table.column"));
    ui.separator();

    let tables = filter_schema(&app.schema().tables, app.schema_filter());
    let filtering = !app.schema_filter().is_empty();
    let mut picked = None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        for table in tables.iter().filter(|t| !filtering || !t.columns.is_empty()) {
            egui::CollapsingHeader::new(table.display_name())
                .id_source(&table.name)
                .default_open(filtering)
                .show(ui, |ui| {
                    for column in &table.columns {
                        let label = match &column.friendly {
                            Some(friendly) => format!("{} ({})", column.name, friendly),
                            None => column.name.clone(),
                        };
                        let mut response = ui.button(label);
                        let mut hover = column.data_type.clone();
                        if let Some(hint) = column.link_hint() {
                            hover = format!("{}\n{}", hover, hint);
                        }
                        if !hover.is_empty() {
                            response = response.on_hover_text(hover);
                        }
                        if response.clicked() {
                            picked = Some(format!("{}.{}", table.name, column.name));
                        }
                    }
                });
        }
    });

    if let Some(field) = picked {
        app.pick_field(&field);
    }
}
