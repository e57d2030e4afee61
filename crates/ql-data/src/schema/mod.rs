//! Database schema metadata for the field picker
//!
//! The engine never depends on this; picked fields only flow back into the
//! question text and the query context.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk: Option<ForeignKey>,
}

impl SchemaField {
    /// Hover text describing the foreign-key link, if any
    pub fn link_hint(&self) -> Option<String> {
        self.fk
            .as_ref()
            .map(|fk| format!("FK -> {}.{}", fk.table, fk.column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly: Option<String>,
    #[serde(default)]
    pub columns: Vec<SchemaField>,
}

impl SchemaTable {
    /// Label shown in the picker, preferring the friendly alias
    pub fn display_name(&self) -> &str {
        self.friendly.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub tables: Vec<SchemaTable>,
}

/// Keep the columns whose `table.column` path contains `filter`,
/// case-insensitively. Every table is kept, possibly with no columns.
pub fn filter_schema(tables: &[SchemaTable], filter: &str) -> Vec<SchemaTable> {
    let needle = filter.to_lowercase();
    tables
        .iter()
        .map(|table| SchemaTable {
            columns: table
                .columns
                .iter()
                .filter(|c| {
                    format!("{}.{}", table.name, c.name)
                        .to_lowercase()
                        .contains(&needle)
                })
                .cloned()
                .collect(),
            ..table.clone()
        })
        .collect()
}

/// Fields picked for the next query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    fields: Vec<String>,
}

impl QueryContext {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Record a picked `table.column` and append it to the question text
    pub fn pick(&mut self, question: &mut String, field: &str) {
        if !self.fields.iter().any(|f| f == field) {
            self.fields.push(field.to_string());
        }
        if !question.is_empty() {
            question.push(' ');
        }
        question.push_str(field);
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}
