//! Stored business datasets and their read-only query operations.
//!
//! A dataset is an immutable ordered sequence of structured rows uploaded by
//! an owner (CSV/JSON import). The only operations after creation are reads:
//! filter, sort, and paginate — evaluated here as pure functions so the
//! store layer stays a dumb row fetcher.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An owner-scoped dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Filename the data was imported from.
    pub source_filename: String,
    /// Import format, e.g. "csv" or "json".
    pub source_type: String,
    /// The rows, in upload order.
    pub records: Vec<Value>,
    pub record_count: usize,
    pub created_at: DateTime<Utc>,
}

/// A query over one dataset's records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetQuery {
    #[serde(default)]
    pub filters: Option<HashMap<String, FilterCondition>>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub pagination: Option<PageSpec>,
}

/// A per-field filter: either an operator map or a bare value (equals).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterCondition {
    Ops(FilterOps),
    Value(Value),
}

/// Supported filter operators. Unknown operator keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOps {
    #[serde(default)]
    pub equals: Option<Value>,
    #[serde(default)]
    pub contains: Option<Value>,
    #[serde(default)]
    pub greater_than: Option<Value>,
    #[serde(default)]
    pub less_than: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}
fn default_limit() -> usize {
    10
}

impl DatasetQuery {
    /// Apply filters, sort, and pagination in that order.
    pub fn apply(&self, records: &[Value]) -> Vec<Value> {
        let mut rows: Vec<Value> = match &self.filters {
            Some(filters) => records
                .iter()
                .filter(|row| matches_filters(row, filters))
                .cloned()
                .collect(),
            None => records.to_vec(),
        };

        if let Some(sort) = &self.sort {
            rows.sort_by(|a, b| {
                let av = stringify(field_of(a, &sort.field));
                let bv = stringify(field_of(b, &sort.field));
                let ord = av.cmp(&bv);
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        if let Some(page) = &self.pagination {
            let limit = page.limit;
            let start = page.page.saturating_sub(1).saturating_mul(limit);
            rows.into_iter().skip(start).take(limit).collect()
        } else {
            rows
        }
    }
}

fn field_of<'a>(row: &'a Value, field: &str) -> Option<&'a Value> {
    row.as_object().and_then(|obj| obj.get(field))
}

/// Render a JSON value the way loose string comparison expects:
/// strings unquoted, scalars via display, missing fields empty.
fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn matches_filters(row: &Value, filters: &HashMap<String, FilterCondition>) -> bool {
    filters
        .iter()
        .all(|(field, cond)| matches_condition(field_of(row, field), cond))
}

fn matches_condition(value: Option<&Value>, cond: &FilterCondition) -> bool {
    match cond {
        FilterCondition::Value(expected) => {
            stringify(value) == stringify(Some(expected))
        }
        FilterCondition::Ops(ops) => {
            if let Some(expected) = &ops.equals {
                if stringify(value) != stringify(Some(expected)) {
                    return false;
                }
            }
            if let Some(needle) = &ops.contains {
                let haystack = stringify(value).to_lowercase();
                if !haystack.contains(&stringify(Some(needle)).to_lowercase()) {
                    return false;
                }
            }
            if let Some(bound) = &ops.greater_than {
                match (as_number(value), as_number(Some(bound))) {
                    (Some(v), Some(b)) if v > b => {}
                    _ => return false,
                }
            }
            if let Some(bound) = &ops.less_than {
                match (as_number(value), as_number(Some(bound))) {
                    (Some(v), Some(b)) if v < b => {}
                    _ => return false,
                }
            }
            true
        }
    }
}
