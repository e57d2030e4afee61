//! Column inference for schema-less record batches

use serde::{Deserialize, Serialize};

use crate::record::{is_native_number, Record};

/// Column classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// A column of a result batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }
}

/// Derive the ordered column set of a batch.
///
/// Column order and kind come from the first record only: a column is
/// `Numeric` iff its first value is a native number. Later rows are never
/// consulted, so a column is never mixed-kind. An empty batch yields no
/// columns.
pub fn infer_columns(batch: &[Record]) -> Vec<Column> {
    let Some(first) = batch.first() else {
        return Vec::new();
    };

    first
        .iter()
        .map(|(name, value)| Column {
            name: name.clone(),
            kind: if is_native_number(Some(value)) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            },
        })
        .collect()
}

/// Names of the numeric columns, in column order
pub fn numeric_column_names(columns: &[Column]) -> Vec<&str> {
    columns
        .iter()
        .filter(|c| c.is_numeric())
        .map(|c| c.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn batch(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_first_record_defines_order_and_kind() {
        let rows = batch(json!([
            {"month": "Ocak", "sales": 120, "note": "12"},
            {"month": "Şubat", "sales": "150", "extra": 3}
        ]));

        let columns = infer_columns(&rows);
        assert_eq!(
            columns,
            vec![
                Column { name: "month".into(), kind: ColumnKind::Text },
                Column { name: "sales".into(), kind: ColumnKind::Numeric },
                Column { name: "note".into(), kind: ColumnKind::Text },
            ]
        );
        assert_eq!(numeric_column_names(&columns), vec!["sales"]);
    }

    #[test]
    fn test_empty_batch_has_no_columns() {
        assert!(infer_columns(&[]).is_empty());
    }

    #[test]
    fn test_null_first_value_is_text() {
        let rows = batch(json!([{"v": null}, {"v": 4}]));
        assert_eq!(infer_columns(&rows)[0].kind, ColumnKind::Text);
    }

    proptest! {
        #[test]
        fn prop_inference_is_idempotent(values in proptest::collection::vec(
            prop_oneof![
                any::<i32>().prop_map(|n| json!(n)),
                "[a-z]{0,6}".prop_map(|s| json!(s)),
                Just(json!(null)),
            ],
            0..6,
        )) {
            let mut record = Record::new();
            for (idx, value) in values.into_iter().enumerate() {
                record.insert(format!("c{}", idx), value);
            }
            let rows = vec![record];
            prop_assert_eq!(infer_columns(&rows), infer_columns(&rows));
        }
    }
}
