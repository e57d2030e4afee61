//! Application state and frame loop

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::{self, Context};
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use ql_core::events::events::{ExportFinished, QueryFailed, ResultLoaded};
use ql_core::{handler_from_fn, EventBus};
use ql_data::{
    normalize_question, run_query, EngineConfig, LocalStore, QueryContext, QueryOutcome, QueryResponse,
    QueryService, RecentQueries, RequestGenerations, RequestTicket, ResultHistory, SchemaResponse,
};
use ql_views::{FileExporter, ResultCards, ViewerContext};

use crate::panels;

/// Last status message, written by event handlers
#[derive(Debug, Clone)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct QueryLensApp {
    config: EngineConfig,
    viewer_context: ViewerContext,
    runtime: tokio::runtime::Runtime,
    service: Arc<dyn QueryService>,

    // Question entry
    question: String,
    query_context: QueryContext,
    generations: Arc<RequestGenerations>,
    pending: Option<RequestTicket>,
    outcomes_tx: UnboundedSender<QueryOutcome>,
    outcomes_rx: UnboundedReceiver<QueryOutcome>,

    // Results
    cards: ResultCards,
    history: ResultHistory,
    shown_history: Option<usize>,

    // Local state
    store: LocalStore,
    recent: RecentQueries,
    schema: SchemaResponse,
    schema_filter: String,

    status: Arc<Mutex<Option<Status>>>,
}

impl QueryLensApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: EngineConfig,
        runtime: tokio::runtime::Runtime,
        service: Arc<dyn QueryService>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let events = EventBus::new();
        let status = Arc::new(Mutex::new(None));
        subscribe_status(&events, &status);

        let exporter = FileExporter::new(&config.export_dir, config.snapshot_width, config.snapshot_height);
        let viewer_context = ViewerContext::new(config.render_context(), Arc::new(exporter), events);

        let schema = match runtime.block_on(service.schema()) {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Schema unavailable: {}", e);
                SchemaResponse::default()
            }
        };

        let store = LocalStore::open(&config.store_path);
        let recent = RecentQueries::load(&store);
        let question = store.saved_query().unwrap_or_default();
        let (outcomes_tx, outcomes_rx) = unbounded_channel();

        Self {
            history: ResultHistory::new(config.history_limit),
            config,
            viewer_context,
            runtime,
            service,
            question,
            query_context: QueryContext::default(),
            generations: Arc::new(RequestGenerations::new()),
            pending: None,
            outcomes_tx,
            outcomes_rx,
            cards: ResultCards::default(),
            shown_history: None,
            store,
            recent,
            schema,
            schema_filter: String::new(),
            status,
        }
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Send the current question; any answer still in flight becomes stale
    fn submit(&mut self, ctx: &Context) {
        let question = normalize_question(&self.question);
        if question.is_empty() {
            return;
        }

        let ticket = self.generations.issue();
        self.pending = Some(ticket);

        let service = self.service.clone();
        let context = self.query_context.fields().to_vec();
        let tx = self.outcomes_tx.clone();
        let repaint = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = run_query(service, ticket, question, context).await;
            if tx.send(outcome).is_err() {
                debug!("Application closed before query #{} finished", ticket.generation());
            }
            repaint.request_repaint();
        });
    }

    fn poll_outcomes(&mut self) {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            if !self.generations.is_current(outcome.ticket) {
                debug!(
                    "Discarding stale answer #{} for '{}'",
                    outcome.ticket.generation(),
                    outcome.question
                );
                continue;
            }
            self.pending = None;

            match outcome.result {
                Ok(response) => self.show_response(&outcome.question, response),
                Err(e) => self.viewer_context.events.publish(QueryFailed {
                    question: outcome.question,
                    error: e.to_string(),
                }),
            }
        }
    }

    fn show_response(&mut self, question: &str, response: QueryResponse) {
        self.cards = ResultCards::from_response(&response, &self.viewer_context.render, self.config.page_size);
        self.viewer_context.events.publish(ResultLoaded {
            question: question.to_string(),
            visual_count: response.visuals.len(),
            row_count: response.row_count(),
        });

        self.history.push(question, response);
        self.shown_history = Some(0);
        self.recent.push(question);
        if let Err(e) = self.recent.save(&mut self.store) {
            warn!("Failed to persist recent queries: {}", e);
        }
    }

    /// Redisplay a past answer without asking the service again
    pub(crate) fn show_history(&mut self, index: usize) {
        let Some(entry) = self.history.get(index) else {
            return;
        };
        self.question = entry.question.clone();
        self.cards =
            ResultCards::from_response(&entry.response, &self.viewer_context.render, self.config.page_size);
        self.shown_history = Some(index);
    }

    pub(crate) fn save_question(&mut self) {
        match self.store.save_query(&self.question) {
            Ok(()) => self.set_status("Question saved", false),
            Err(e) => self.set_status(format!("Could not save question: {}", e), true),
        }
    }

    pub(crate) fn choose_export_dir(&mut self) {
        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.export_dir)
            .pick_folder()
        else {
            return;
        };
        info!("Exporting to {:?}", dir);
        self.set_export_dir(dir);
    }

    fn set_export_dir(&mut self, dir: PathBuf) {
        let exporter = FileExporter::new(&dir, self.config.snapshot_width, self.config.snapshot_height);
        self.viewer_context.exporter = Arc::new(exporter);
        self.config.export_dir = dir;
    }

    fn set_status(&self, text: impl Into<String>, is_error: bool) {
        *self.status.lock() = Some(Status {
            text: text.into(),
            is_error,
        });
    }

    fn question_bar(&mut self, ctx: &Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.question)
                    .hint_text("Ask a question...")
                    .desired_width(ui.available_width() - 220.0),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let can_run = !self.is_pending() && !self.question.trim().is_empty();
            let label = if self.is_pending() { "Running..." } else { "Run" };
            let clicked = ui.add_enabled(can_run, egui::Button::new(label)).clicked();
            if can_run && (clicked || enter) {
                self.submit(ctx);
            }

            if ui.button("Save").on_hover_text("Remember this question").clicked() {
                self.save_question();
            }
            if ui.button("📁").on_hover_text("Choose export folder").clicked() {
                self.choose_export_dir();
            }
        });

        if !self.query_context.fields().is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label("Context:");
                for field in self.query_context.fields() {
                    ui.label(egui::RichText::new(field).monospace());
                }
                if ui.small_button("Clear").clicked() {
                    self.query_context.clear();
                }
            });
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.status.lock().as_ref() {
                Some(status) if status.is_error => {
                    ui.colored_label(egui::Color32::RED, &status.text);
                }
                Some(status) => {
                    ui.label(&status.text);
                }
                None => {
                    ui.label(format!("Connected to {}", self.service.service_name()));
                }
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("Exports: {}", self.config.export_dir.display()));
            });
        });
    }
}

/// Route result and export events into the status line
fn subscribe_status(events: &EventBus, status: &Arc<Mutex<Option<Status>>>) {
    let slot = status.clone();
    events.subscribe::<ResultLoaded>(handler_from_fn(move |event| {
        if let Some(e) = event.as_any().downcast_ref::<ResultLoaded>() {
            *slot.lock() = Some(Status {
                text: format!("{} visuals, {} rows for '{}'", e.visual_count, e.row_count, e.question),
                is_error: false,
            });
        }
    }));

    let slot = status.clone();
    events.subscribe::<QueryFailed>(handler_from_fn(move |event| {
        if let Some(e) = event.as_any().downcast_ref::<QueryFailed>() {
            *slot.lock() = Some(Status {
                text: format!("Query failed: {}", e.error),
                is_error: true,
            });
        }
    }));

    let slot = status.clone();
    events.subscribe::<ExportFinished>(handler_from_fn(move |event| {
        if let Some(e) = event.as_any().downcast_ref::<ExportFinished>() {
            let (text, is_error) = match (&e.path, &e.error) {
                (_, Some(error)) => (format!("{} export failed: {}", e.artifact, error), true),
                (Some(path), None) => (format!("Saved {}", path.display()), false),
                (None, None) => (format!("Nothing to export for {}", e.artifact), false),
            };
            *slot.lock() = Some(Status { text, is_error });
        }
    }));
}

impl eframe::App for QueryLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_outcomes();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::SidePanel::left("history_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                panels::history_panel(self, ui);
            });

        egui::SidePanel::right("schema_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                panels::schema_panel(self, ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.question_bar(ctx, ui);
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.cards.ui(&self.viewer_context, ui);
            });
        });
    }
}

/// Accessors for the side panels
impl QueryLensApp {
    pub(crate) fn history(&self) -> &ResultHistory {
        &self.history
    }

    pub(crate) fn shown_history(&self) -> Option<usize> {
        self.shown_history
    }

    pub(crate) fn recent(&self) -> &RecentQueries {
        &self.recent
    }

    pub(crate) fn use_recent(&mut self, question: String) {
        self.question = question;
    }

    pub(crate) fn schema(&self) -> &SchemaResponse {
        &self.schema
    }

    pub(crate) fn schema_filter_mut(&mut self) -> &mut String {
        &mut self.schema_filter
    }

    pub(crate) fn schema_filter(&self) -> &str {
        &self.schema_filter
    }

    pub(crate) fn pick_field(&mut self, field: &str) {
        self.query_context.pick(&mut self.question, field);
    }

    pub(crate) fn clear_recent(&mut self) {
        self.recent.clear();
        if let Err(e) = self.recent.save(&mut self.store) {
            warn!("Failed to persist recent queries: {}", e);
        }
    }
}
