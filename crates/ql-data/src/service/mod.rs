//! Query service boundary
//!
//! Translating questions to SQL happens elsewhere; the viewer only needs an
//! answer `{sql, visuals}` per question and the schema for the field picker.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::query::normalize_question;
use crate::response::QueryResponse;
use crate::schema::SchemaResponse;
use crate::DataError;

/// Source of query answers
#[async_trait::async_trait]
pub trait QueryService: Send + Sync {
    /// Answer a normalised question, optionally scoped to picked fields
    async fn query(&self, question: &str, context: &[String]) -> Result<QueryResponse, DataError>;

    /// Table/column metadata for the field picker
    async fn schema(&self) -> Result<SchemaResponse, DataError>;

    /// Name shown in logs and the status line
    fn service_name(&self) -> &str;
}

#[derive(Deserialize)]
struct FixtureFile {
    #[serde(default)]
    schema: SchemaResponse,
    #[serde(default)]
    answers: Vec<FixtureAnswer>,
}

#[derive(Deserialize)]
struct FixtureAnswer {
    question: String,
    response: QueryResponse,
}

/// Query service answering from a JSON file of canned responses
pub struct FixtureService {
    name: String,
    answers: HashMap<String, QueryResponse>,
    schema: SchemaResponse,
    latency: Option<Duration>,
}

impl FixtureService {
    /// Parse fixture JSON: `{"schema": {...}, "answers": [{"question", "response"}]}`
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, DataError> {
        let file: FixtureFile = serde_json::from_str(json)?;
        let answers = file
            .answers
            .into_iter()
            .map(|a| (normalize_question(&a.question), a.response))
            .collect::<HashMap<_, _>>();

        let name = name.into();
        tracing::info!("Fixture service '{}' loaded {} answers", name, answers.len());

        Ok(Self {
            name,
            answers,
            schema: file.schema,
            latency: None,
        })
    }

    /// Load a fixture file
    pub async fn load(path: &Path) -> Result<Self, DataError> {
        let json = tokio::fs::read_to_string(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("fixtures")
            .to_string();
        Self::from_json(name, &json)
    }

    /// Delay every answer, to mimic a remote service
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Questions this service can answer, sorted
    pub fn questions(&self) -> Vec<&str> {
        let mut questions: Vec<&str> = self.answers.keys().map(String::as_str).collect();
        questions.sort_unstable();
        questions
    }
}

#[async_trait::async_trait]
impl QueryService for FixtureService {
    async fn query(&self, question: &str, context: &[String]) -> Result<QueryResponse, DataError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let key = normalize_question(question);
        tracing::debug!("Fixture lookup '{}' with {} context fields", key, context.len());
        self.answers
            .get(&key)
            .cloned()
            .ok_or(DataError::UnknownQuestion(key))
    }

    async fn schema(&self) -> Result<SchemaResponse, DataError> {
        Ok(self.schema.clone())
    }

    fn service_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{run_query, RequestGenerations};
    use std::sync::Arc;

    const FIXTURE: &str = r#"{
        "schema": {"tables": [{"name": "Satislar", "columns": [{"name": "tarih", "type": "TEXT"}]}]},
        "answers": [
            {"question": "Aylık   Satışlar", "response": {
                "sql": "SELECT ay, satis FROM Satislar",
                "visuals": [{"type": "bar", "x": "ay", "y": "satis", "data": [{"ay": "Ocak", "satis": 120}]}]
            }},
            {"question": "toplam", "response": {"sql": "SELECT 1", "chart_type": "table", "data": []}}
        ]
    }"#;

    #[tokio::test]
    async fn test_lookup_uses_normalised_question() {
        let service = FixtureService::from_json("test", FIXTURE).unwrap();
        let response = service.query("  AYLIK satışlar ", &[]).await;
        // "AYLIK" lowercases to "aylık" under Turkish rules
        assert_eq!(response.unwrap().sql, "SELECT ay, satis FROM Satislar");
        assert_eq!(service.questions(), vec!["aylık satışlar", "toplam"]);
    }

    #[tokio::test]
    async fn test_unknown_question_is_an_error() {
        let service = FixtureService::from_json("test", FIXTURE).unwrap();
        let err = service.query("nope", &[]).await.unwrap_err();
        assert!(matches!(err, DataError::UnknownQuestion(q) if q == "nope"));
    }

    #[tokio::test]
    async fn test_schema_is_served() {
        let service = FixtureService::from_json("test", FIXTURE).unwrap();
        assert_eq!(service.schema().await.unwrap().tables.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_answer_is_detectable() {
        let service: Arc<dyn QueryService> = Arc::new(
            FixtureService::from_json("test", FIXTURE)
                .unwrap()
                .with_latency(Duration::from_millis(20)),
        );
        let generations = RequestGenerations::new();

        let slow = generations.issue();
        let pending = tokio::spawn(run_query(service.clone(), slow, "toplam".into(), Vec::new()));
        let fast = generations.issue();
        let latest = run_query(service, fast, "aylık satışlar".into(), Vec::new()).await;

        let stale = pending.await.unwrap();
        assert!(!generations.is_current(stale.ticket));
        assert!(generations.is_current(latest.ticket));
        assert!(latest.result.is_ok());
    }
}
