//! Query results, configuration and local state for the result viewer

pub mod config;
pub mod history;
pub mod query;
pub mod response;
pub mod schema;
pub mod service;
pub mod storage;

use thiserror::Error;

// Re-exports
pub use config::{ConfigError, EngineConfig};
pub use history::{HistoryEntry, RecentQueries, ResultHistory};
pub use query::{normalize_question, run_query, QueryOutcome, RequestGenerations, RequestTicket};
pub use response::{check_axis_fields, FieldIssue, QueryResponse, VisualKind, VisualSpec, YSpec};
pub use schema::{filter_schema, ForeignKey, QueryContext, SchemaField, SchemaResponse, SchemaTable};
pub use service::{FixtureService, QueryService};
pub use storage::LocalStore;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Query service error: {0}")]
    Service(String),

    #[error("No answer for question '{0}'")]
    UnknownQuestion(String),
}
