//! In-process evaluation of list filters.
//!
//! `PgRecordStore` expresses the same rules in SQL; this module is the
//! reference form used by the in-memory store and by the tests.

use std::cmp::Ordering;

use serde_json::Value;

use crate::records::model::{ListFilter, Record};

/// True when `record` satisfies every present predicate of `filter`.
///
/// `client_name` is the related client's name for requirements, consulted by
/// the free-text search only.
pub fn matches(record: &Record, filter: &ListFilter, client_name: Option<&str>) -> bool {
    for (field, wanted) in filter.equality_predicates() {
        if let Some(wanted) = wanted {
            if record.text(field) != Some(wanted) {
                return false;
            }
        }
    }

    match filter.search.as_deref() {
        None => true,
        Some(term) => matches_search(record, term, client_name),
    }
}

fn matches_search(record: &Record, term: &str, client_name: Option<&str>) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

    let own = record
        .kind
        .search_fields()
        .iter()
        .filter_map(|f| record.get(f).and_then(Value::as_str))
        .any(contains);

    own || (record.kind.searches_client_name() && client_name.is_some_and(contains))
}

/// Newest first; ties broken by id so the order is total.
pub fn newest_first(a: &Record, b: &Record) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}
