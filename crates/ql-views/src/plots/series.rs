//! Series derivation from a record batch

use ql_core::{cell, is_native_number, native_number, raw_text, Record};
use ql_data::YSpec;
use ql_render::ChartKind;

/// One (category, value) pair
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Index of the source row in the batch
    pub row: usize,
    pub category: String,
    pub value: f64,
}

/// Plottable values of one y column
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn categories(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.category.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// The x column and every row's x value, in batch order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XAxis {
    pub column: Option<String>,
    pub labels: Vec<String>,
    /// Native numeric x values, set only when the first row's x is a number
    pub numbers: Option<Vec<Option<f64>>>,
}

impl XAxis {
    pub fn from_batch(batch: &[Record], x: Option<&str>) -> Self {
        let column = x.filter(|x| !x.is_empty());
        let labels = batch
            .iter()
            .map(|row| raw_text(column.and_then(|x| cell(row, x))))
            .collect();
        let numbers = column
            .filter(|x| batch.first().map_or(false, |row| is_native_number(cell(row, x))))
            .map(|x| batch.iter().map(|row| native_number(cell(row, x))).collect());
        Self {
            column: column.map(str::to_string),
            labels,
            numbers,
        }
    }

    /// Numeric x value of `row`, when the axis is numeric
    pub fn number(&self, row: usize) -> Option<f64> {
        self.numbers.as_ref()?.get(row).copied().flatten()
    }
}

/// Y columns requested by `y`, falling back to every column but `x` when
/// the request is empty. Columns whose first value is not a native number
/// are dropped.
pub fn resolve_y_columns(batch: &[Record], x: Option<&str>, y: Option<&YSpec>) -> Vec<String> {
    let Some(first) = batch.first() else {
        return Vec::new();
    };

    let mut requested = y.map(YSpec::columns).unwrap_or_default();
    if requested.first().map_or(true, |c| c.is_empty()) {
        requested = first
            .keys()
            .filter(|k| Some(k.as_str()) != x)
            .cloned()
            .collect();
    }

    let (kept, dropped): (Vec<String>, Vec<String>) = requested
        .into_iter()
        .partition(|c| is_native_number(cell(first, c)));
    if !dropped.is_empty() {
        tracing::debug!("Dropping non-numeric y columns {:?}", dropped);
    }
    kept
}

/// Derive one series per numeric y column.
///
/// Each series pairs every row's `x` value with its y value; rows whose y
/// value is not a native number contribute no point. Points keep the index
/// of the row they came from.
pub fn derive_series(batch: &[Record], x: Option<&str>, y: Option<&YSpec>) -> Vec<Series> {
    let series: Vec<Series> = resolve_y_columns(batch, x, y)
        .into_iter()
        .map(|column| Series {
            points: batch
                .iter()
                .enumerate()
                .filter_map(|(index, row)| {
                    native_number(cell(row, &column)).map(|value| SeriesPoint {
                        row: index,
                        category: raw_text(x.and_then(|x| cell(row, x))),
                        value,
                    })
                })
                .collect(),
            label: column,
        })
        .collect();

    tracing::debug!(
        "Derived {} series from {} rows (x: {:?})",
        series.len(),
        batch.len(),
        x
    );
    series
}

/// Series a chart of `kind` plots: share-of-whole kinds keep only the first
pub fn series_for_kind(mut series: Vec<Series>, kind: ChartKind) -> Vec<Series> {
    if kind.is_share_of_whole() {
        series.truncate(1);
    }
    series
}
