//! Question normalisation and request generations
//!
//! Every submitted question takes a ticket from [`RequestGenerations`]. When
//! an answer arrives, only the holder of the latest ticket may replace the
//! displayed result; answers to superseded questions are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::response::QueryResponse;
use crate::service::QueryService;
use crate::DataError;

/// Trim, collapse whitespace runs and lowercase with Turkish casing rules
pub fn normalize_question(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        match c {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}

/// Identifies one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Monotonic submission counter
#[derive(Debug, Default)]
pub struct RequestGenerations {
    latest: AtomicU64,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission, superseding all earlier tickets
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the latest submission
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Answer (or failure) for one ticket
#[derive(Debug)]
pub struct QueryOutcome {
    pub ticket: RequestTicket,
    pub question: String,
    pub result: Result<QueryResponse, DataError>,
}

/// Ask `service` and tag the answer with its ticket
pub async fn run_query(
    service: Arc<dyn QueryService>,
    ticket: RequestTicket,
    question: String,
    context: Vec<String>,
) -> QueryOutcome {
    tracing::info!(
        "Query #{} to {}: '{}' (context: {:?})",
        ticket.generation(),
        service.service_name(),
        question,
        context
    );
    let result = service.query(&question, &context).await;
    match &result {
        Ok(response) => tracing::info!(
            "Query #{} answered with {} visuals",
            ticket.generation(),
            response.visuals.len()
        ),
        Err(e) => tracing::error!("Query #{} failed: {}", ticket.generation(), e),
    }
    QueryOutcome {
        ticket,
        question,
        result,
    }
}
