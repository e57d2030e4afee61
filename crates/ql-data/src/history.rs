//! Answered-query history and the recent-questions list

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::QueryResponse;
use crate::storage::{LocalStore, QUERY_HISTORY_KEY};
use crate::DataError;

/// One answered question
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub question: String,
    pub response: QueryResponse,
    pub answered_at: DateTime<Utc>,
}

/// Bounded newest-first list of answered questions
#[derive(Debug, Clone)]
pub struct ResultHistory {
    limit: usize,
    items: VecDeque<HistoryEntry>,
}

impl ResultHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            items: VecDeque::new(),
        }
    }

    /// Record an answer, dropping the oldest beyond the limit
    pub fn push(&mut self, question: impl Into<String>, response: QueryResponse) {
        self.items.push_front(HistoryEntry {
            question: question.into(),
            response,
            answered_at: Utc::now(),
        });
        self.items.truncate(self.limit);
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Recently submitted questions, deduplicated, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentQueries {
    questions: Vec<String>,
}

impl RecentQueries {
    pub const LIMIT: usize = 10;

    /// Restore the list persisted under `queryHistory`
    pub fn load(store: &LocalStore) -> Self {
        let mut recent: RecentQueries = store.get(QUERY_HISTORY_KEY).unwrap_or_default();
        recent.questions.truncate(Self::LIMIT);
        recent
    }

    pub fn save(&self, store: &mut LocalStore) -> Result<(), DataError> {
        store.set(QUERY_HISTORY_KEY, self)
    }

    /// Move `question` to the front; blank questions are ignored
    pub fn push(&mut self, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            return;
        }
        self.questions.retain(|q| q != question);
        self.questions.insert(0, question.to_string());
        self.questions.truncate(Self::LIMIT);
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn clear(&mut self) {
        self.questions.clear();
    }
}
