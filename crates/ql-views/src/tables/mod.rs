//! Table engine: filter, sort, paginate and select over a record batch
//!
//! Everything here is a pure function of `(batch, state)`. The egui widget in
//! [`view`] only renders the [`Projection`] and feeds user input back into
//! [`TableState`].

mod view;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use ql_core::{cell, raw_text, Column, Record};
use serde_json::Value;

pub use view::{TableConfig, TableView};

/// Rows per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-column sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page_size: usize,
    pub page_index: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_index: 0,
        }
    }
}

/// A row on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow {
    /// Position in the filtered and sorted view; this is the selection identity
    pub view_index: usize,
    /// Index into the original batch
    pub source_index: usize,
}

/// What the table shows for one state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub visible_rows: Vec<VisibleRow>,
    /// Rows matching the filter
    pub row_count: usize,
    pub page_count: usize,
    /// Page actually shown, after clamping
    pub page_index: usize,
}

/// Rows and columns handed to the table exports: every filtered row in sort
/// order, ignoring pagination and selection
#[derive(Debug, Clone)]
pub struct TableExport<'a> {
    pub columns: Vec<&'a str>,
    pub rows: Vec<&'a Record>,
}

impl TableExport<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// Whether any cell of `record` contains `needle` (already lowercased).
/// Every key of the record counts, shown or not.
fn row_matches(record: &Record, needle: &str) -> bool {
    needle.is_empty()
        || record
            .values()
            .any(|v| raw_text(Some(v)).to_lowercase().contains(needle))
}

fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(_) => 5,
    }
}

/// Natural ordering of two cells: numbers numerically, strings
/// lexicographically, mixed kinds by kind
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y @ (Value::Array(_) | Value::Object(_)))) => {
            raw_text(Some(x)).cmp(&raw_text(Some(y)))
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Source indices of the rows matching `filter`, in sort order.
///
/// A sort on a column not in `columns` is ignored.
pub fn ordered_rows(batch: &[Record], columns: &[Column], sort: Option<&SortState>, filter: &str) -> Vec<usize> {
    let needle = filter.to_lowercase();
    let mut rows: Vec<usize> = batch
        .iter()
        .enumerate()
        .filter(|(_, record)| row_matches(record, &needle))
        .map(|(i, _)| i)
        .collect();

    if let Some(sort) = sort.filter(|s| columns.iter().any(|c| c.name == s.column)) {
        rows.sort_by(|&a, &b| {
            let ordering = compare_cells(cell(&batch[a], &sort.column), cell(&batch[b], &sort.column));
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
    rows
}

/// Page count for `row_count` filtered rows, at least one
pub fn page_count(row_count: usize, page_size: usize) -> usize {
    row_count.div_ceil(page_size.max(1)).max(1)
}

/// Filter, sort and paginate `batch`
pub fn project(
    batch: &[Record],
    columns: &[Column],
    sort: Option<&SortState>,
    filter: &str,
    page: PageState,
) -> Projection {
    let rows = ordered_rows(batch, columns, sort, filter);
    let page_size = page.page_size.max(1);
    let page_count = page_count(rows.len(), page_size);
    let page_index = page.page_index.min(page_count - 1);

    let start = (page_index * page_size).min(rows.len());
    let end = (start + page_size).min(rows.len());
    let visible_rows = rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, &source_index)| VisibleRow {
            view_index: start + offset,
            source_index,
        })
        .collect();

    Projection {
        visible_rows,
        row_count: rows.len(),
        page_count,
        page_index,
    }
}

/// Columns and rows for the table exports
pub fn export_projection<'a>(
    batch: &'a [Record],
    columns: &'a [Column],
    sort: Option<&SortState>,
    filter: &str,
) -> TableExport<'a> {
    TableExport {
        columns: columns.iter().map(|c| c.name.as_str()).collect(),
        rows: ordered_rows(batch, columns, sort, filter)
            .into_iter()
            .map(|i| &batch[i])
            .collect(),
    }
}

/// Interactive table state: sort, filter, page and selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    sort: Option<SortState>,
    filter: String,
    page: PageState,
    selection: BTreeSet<usize>,
}

impl TableState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: PageState {
                page_size: page_size.max(1),
                page_index: 0,
            },
            ..Self::default()
        }
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    /// Forget everything tied to the previous batch
    pub fn reset_for_batch(&mut self) {
        *self = Self::new(self.page.page_size);
    }

    /// Change the filter. Selection identities shift, so the selection is
    /// cleared; the page index is clamped on the next projection.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        let filter = filter.into();
        if filter != self.filter {
            self.filter = filter;
            self.selection.clear();
        }
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        if sort != self.sort {
            self.sort = sort;
            self.selection.clear();
        }
    }

    /// Header click: ascending, then descending, then unsorted
    pub fn toggle_sort(&mut self, column: &str) {
        let next = match &self.sort {
            Some(s) if s.column == column => match s.direction {
                SortDirection::Ascending => Some(SortDirection::Descending),
                SortDirection::Descending => None,
            },
            _ => Some(SortDirection::Ascending),
        };
        self.set_sort(next.map(|direction| SortState {
            column: column.to_string(),
            direction,
        }));
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.page.page_index = page_index;
    }

    pub fn next_page(&mut self, page_count: usize) {
        self.page.page_index = (self.page.page_index + 1).min(page_count.saturating_sub(1));
    }

    pub fn previous_page(&mut self) {
        self.page.page_index = self.page.page_index.saturating_sub(1);
    }

    /// Project `batch` and keep the clamped page index
    pub fn project(&mut self, batch: &[Record], columns: &[Column]) -> Projection {
        let projection = project(batch, columns, self.sort.as_ref(), &self.filter, self.page);
        if projection.page_index != self.page.page_index {
            tracing::debug!(
                "Clamping table page {} to {}",
                self.page.page_index,
                projection.page_index
            );
            self.page.page_index = projection.page_index;
        }
        projection
    }

    pub fn export_projection<'a>(&self, batch: &'a [Record], columns: &'a [Column]) -> TableExport<'a> {
        export_projection(batch, columns, self.sort.as_ref(), &self.filter)
    }

    pub fn is_selected(&self, view_index: usize) -> bool {
        self.selection.contains(&view_index)
    }

    pub fn toggle_row(&mut self, view_index: usize) {
        if !self.selection.remove(&view_index) {
            self.selection.insert(view_index);
        }
    }

    /// Whether every row on the page is selected
    pub fn page_selected(&self, projection: &Projection) -> bool {
        !projection.visible_rows.is_empty()
            && projection
                .visible_rows
                .iter()
                .all(|r| self.selection.contains(&r.view_index))
    }

    /// "Select all": selects the current page only, or clears it when it is
    /// already fully selected
    pub fn toggle_page(&mut self, projection: &Projection) {
        if self.page_selected(projection) {
            for row in &projection.visible_rows {
                self.selection.remove(&row.view_index);
            }
        } else {
            self.selection
                .extend(projection.visible_rows.iter().map(|r| r.view_index));
        }
    }

    /// Selected view indices, ascending
    pub fn selected(&self) -> Vec<usize> {
        self.selection.iter().copied().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}
