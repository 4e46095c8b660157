//! Search, sort and paginate for list views.
//!
//! Every list page fetches the whole collection once and then filters it
//! locally. [`TableQuery::apply`] is the single implementation of that
//! behaviour, shared by every entity kind.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::records::Record;

/// Rows per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on rows per page.
pub const MAX_PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Clicking the same column header flips the direction; a new column
    /// starts ascending.
    pub fn toggle(current: Option<&SortSpec>, field: &str) -> SortSpec {
        match current {
            Some(spec) if spec.field == field => SortSpec {
                field: field.to_string(),
                direction: match spec.direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => SortSpec::asc(field),
        }
    }
}

/// State of a list view: search box, sort column, current page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// One page of filtered, sorted rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    /// 1-based page actually returned (clamped to the last page).
    pub page: usize,
    pub page_size: usize,
    /// Rows matching the search, across all pages.
    pub total_matching: usize,
    pub total_pages: usize,
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_page_size(page_size: Option<usize>) -> usize {
    page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

impl TableQuery {
    /// Filter, sort and slice `records` according to this query.
    pub fn apply(&self, records: &[Record]) -> TablePage<Record> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&Record> = records
            .iter()
            .filter(|r| needle.as_deref().map_or(true, |n| record_matches(r, n)))
            .collect();

        if let Some(sort) = &self.sort {
            // `sort_by` is stable, so equal keys keep their server order.
            matching.sort_by(|a, b| {
                compare_values(a.field(&sort.field), b.field(&sort.field), sort.direction)
            });
        }

        let page_size = clamp_page_size(self.page_size);
        let total_matching = matching.len();
        let total_pages = total_matching.div_ceil(page_size).max(1);
        let page = self.page.unwrap_or(1).clamp(1, total_pages);

        let rows = matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        TablePage {
            rows,
            page,
            page_size,
            total_matching,
            total_pages,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record_matches(record: &Record, needle: &str) -> bool {
    if record.id.to_string().contains(needle) {
        return true;
    }
    record.fields.values().any(|value| match value {
        serde_json::Value::String(s) => s.to_lowercase().contains(needle),
        serde_json::Value::Number(n) => n.to_string().contains(needle),
        _ => false,
    })
}

/// Numbers compare numerically, strings case-insensitively. Missing or null
/// values always sort last, in both directions.
fn compare_values(
    a: Option<serde_json::Value>,
    b: Option<serde_json::Value>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_present(&x, &y);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_present(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value;

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => sort_text(x).cmp(&sort_text(y)),
    }
}

fn sort_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}
