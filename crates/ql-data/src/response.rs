//! Query service response model

use ql_core::Record;
use serde::{Deserialize, Serialize};

/// Kind of a visual returned by the query service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Table,
    Bar,
    Line,
    Scatter,
    Pie,
    Doughnut,
}

impl VisualKind {
    pub const CHART_KINDS: [VisualKind; 5] = [
        VisualKind::Bar,
        VisualKind::Line,
        VisualKind::Scatter,
        VisualKind::Pie,
        VisualKind::Doughnut,
    ];

    pub fn is_chart(&self) -> bool {
        !matches!(self, VisualKind::Table)
    }

    /// Pie and doughnut plot one series as shares of a whole
    pub fn is_share_of_whole(&self) -> bool {
        matches!(self, VisualKind::Pie | VisualKind::Doughnut)
    }

    pub fn name(&self) -> &'static str {
        match self {
            VisualKind::Table => "table",
            VisualKind::Bar => "bar",
            VisualKind::Line => "line",
            VisualKind::Scatter => "scatter",
            VisualKind::Pie => "pie",
            VisualKind::Doughnut => "doughnut",
        }
    }
}

/// Requested y-axis columns: a list or a comma-separated string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YSpec {
    List(Vec<String>),
    Text(String),
}

impl YSpec {
    /// Column names in request order; strings are split on commas and trimmed
    pub fn columns(&self) -> Vec<String> {
        match self {
            YSpec::List(names) => names.clone(),
            YSpec::Text(text) => text.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

impl From<&str> for YSpec {
    fn from(text: &str) -> Self {
        YSpec::Text(text.to_string())
    }
}

impl From<Vec<&str>> for YSpec {
    fn from(names: Vec<&str>) -> Self {
        YSpec::List(names.into_iter().map(str::to_string).collect())
    }
}

/// One visual of a query answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualSpec {
    #[serde(rename = "type")]
    pub kind: VisualKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<YSpec>,
    #[serde(default)]
    pub data: Vec<Record>,
}

impl VisualSpec {
    pub fn table(data: Vec<Record>) -> Self {
        Self {
            kind: VisualKind::Table,
            x: None,
            y: None,
            data,
        }
    }
}

/// Answer to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireResponse")]
pub struct QueryResponse {
    pub sql: String,
    pub visuals: Vec<VisualSpec>,
}

impl QueryResponse {
    /// Rows of the largest visual, for status reporting
    pub fn row_count(&self) -> usize {
        self.visuals.iter().map(|v| v.data.len()).max().unwrap_or(0)
    }
}

/// Both response shapes the backend has produced
#[derive(Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Visuals {
        #[serde(default)]
        sql: Option<String>,
        visuals: Vec<VisualSpec>,
    },
    Legacy {
        #[serde(default)]
        sql: Option<String>,
        #[serde(default)]
        chart_type: Option<VisualKind>,
        #[serde(default)]
        x: Option<String>,
        #[serde(default)]
        y: Option<YSpec>,
        data: Vec<Record>,
    },
}

impl From<WireResponse> for QueryResponse {
    fn from(wire: WireResponse) -> Self {
        match wire {
            WireResponse::Visuals { sql, visuals } => QueryResponse {
                sql: sql.unwrap_or_default(),
                visuals,
            },
            WireResponse::Legacy {
                sql,
                chart_type,
                x,
                y,
                data,
            } => {
                let visuals = match chart_type {
                    Some(kind) if kind.is_chart() => vec![
                        VisualSpec::table(data.clone()),
                        VisualSpec { kind, x, y, data },
                    ],
                    _ => vec![VisualSpec {
                        kind: VisualKind::Table,
                        x,
                        y,
                        data,
                    }],
                };
                QueryResponse {
                    sql: sql.unwrap_or_default(),
                    visuals,
                }
            }
        }
    }
}

/// A requested axis field missing from a result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub row: usize,
    pub field: String,
    /// Key that matches the field case-insensitively, if any
    pub near_match: Option<String>,
}

/// Rows inspected by [`check_axis_fields`]
const AXIS_CHECK_ROWS: usize = 5;

/// Report requested x/y fields missing from the first rows of a batch.
///
/// Purely diagnostic: each issue is logged as a warning and returned.
pub fn check_axis_fields(rows: &[Record], x: Option<&str>, y: Option<&YSpec>) -> Vec<FieldIssue> {
    let mut expected: Vec<String> = Vec::new();
    if let Some(x) = x.filter(|x| !x.is_empty()) {
        expected.push(x.to_string());
    }
    if let Some(y) = y {
        expected.extend(y.columns().into_iter().filter(|c| !c.is_empty()));
    }
    if expected.is_empty() {
        return Vec::new();
    }

    let mut issues = Vec::new();
    for (row_idx, row) in rows.iter().take(AXIS_CHECK_ROWS).enumerate() {
        for field in &expected {
            if row.contains_key(field) {
                continue;
            }
            let lowered = field.to_lowercase();
            let near_match = row.keys().find(|k| k.to_lowercase() == lowered).cloned();
            match &near_match {
                Some(found) => tracing::warn!(
                    "Field name mismatch in row {}: expected '{}', found '{}'",
                    row_idx,
                    field,
                    found
                ),
                None => tracing::warn!("Missing field '{}' in row {}", field, row_idx),
            }
            issues.push(FieldIssue {
                row: row_idx,
                field: field.clone(),
                near_match,
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_visuals_shape() {
        let response: QueryResponse = serde_json::from_value(json!({
            "sql": "SELECT month, sales FROM s",
            "visuals": [
                {"type": "table", "data": [{"month": "Ocak", "sales": 120}]},
                {"type": "bar", "x": "month", "y": ["sales"], "data": [{"month": "Ocak", "sales": 120}]}
            ]
        }))
        .unwrap();

        assert_eq!(response.visuals.len(), 2);
        assert_eq!(response.visuals[1].kind, VisualKind::Bar);
        assert_eq!(response.visuals[1].y, Some(YSpec::List(vec!["sales".into()])));
        assert_eq!(response.row_count(), 1);
    }

    #[test]
    fn test_legacy_shape_becomes_table_plus_chart() {
        let response: QueryResponse = serde_json::from_value(json!({
            "sql": "SELECT 1",
            "chart_type": "line",
            "x": "ay",
            "y": "ciro, kar",
            "data": [{"ay": "Ocak", "ciro": 1, "kar": 2}]
        }))
        .unwrap();

        let kinds: Vec<VisualKind> = response.visuals.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![VisualKind::Table, VisualKind::Line]);
        assert_eq!(
            response.visuals[1].y.as_ref().unwrap().columns(),
            vec!["ciro".to_string(), "kar".to_string()]
        );
    }

    #[test]
    fn test_legacy_table_only() {
        let response: QueryResponse = serde_json::from_value(json!({
            "sql": "SELECT 1",
            "chart_type": "table",
            "data": []
        }))
        .unwrap();
        assert_eq!(response.visuals.len(), 1);
        assert_eq!(response.visuals[0].kind, VisualKind::Table);
    }

    #[test]
    fn test_yspec_text_split() {
        assert_eq!(YSpec::from(" a , b ").columns(), vec!["a", "b"]);
        assert_eq!(YSpec::from("").columns(), vec![""]);
    }

    #[test]
    fn test_axis_field_diagnostics() {
        let rows: Vec<Record> =
            serde_json::from_value(json!([{"Month": "Ocak", "sales": 1}])).unwrap();
        let issues = check_axis_fields(&rows, Some("month"), Some(&YSpec::from("sales, kar")));

        assert_eq!(
            issues,
            vec![
                FieldIssue { row: 0, field: "month".into(), near_match: Some("Month".into()) },
                FieldIssue { row: 0, field: "kar".into(), near_match: None },
            ]
        );
    }
}
