//! Pagination contract shared by list queries.
//!
//! # Invariants
//! - Limit defaults to 20 when absent or zero and is capped at 100.
//! - Pages carry the normalized limit actually applied.

use serde::{Deserialize, Serialize};

pub const PAGE_DEFAULT_LIMIT: u32 = 20;
pub const PAGE_LIMIT_MAX: u32 = 100;

/// Requested window over an ordered result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl PageRequest {
    pub fn new(limit: Option<u32>, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Returns the same request with its limit normalized.
    pub fn normalized(self) -> Self {
        Self {
            limit: Some(normalize_page_limit(self.limit)),
            offset: self.offset,
        }
    }

    pub fn applied_limit(&self) -> u32 {
        normalize_page_limit(self.limit)
    }
}

/// One page of results plus the information needed to fetch the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub applied_limit: u32,
    pub offset: u32,
    /// Rows matching the filter, ignoring the window.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + (self.items.len() as u64) < self.total
    }
}

/// Normalizes list limit according to the paging contract.
pub fn normalize_page_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => PAGE_DEFAULT_LIMIT,
        Some(value) if value > PAGE_LIMIT_MAX => PAGE_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Appends `LIMIT ? OFFSET ?` for a normalized page.
pub(crate) fn push_page_clause(
    sql: &mut String,
    bind_values: &mut Vec<rusqlite::types::Value>,
    page: &PageRequest,
) {
    sql.push_str(" LIMIT ?");
    bind_values.push(rusqlite::types::Value::Integer(i64::from(
        page.applied_limit(),
    )));
    if page.offset > 0 {
        sql.push_str(" OFFSET ?");
        bind_values.push(rusqlite::types::Value::Integer(i64::from(page.offset)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(normalize_page_limit(None), 20);
        assert_eq!(normalize_page_limit(Some(0)), 20);
        assert_eq!(normalize_page_limit(Some(7)), 7);
        assert_eq!(normalize_page_limit(Some(500)), 100);
    }

    #[test]
    fn has_more_compares_window_with_total() {
        let page = Page {
            items: vec![1, 2],
            applied_limit: 2,
            offset: 2,
            total: 5,
        };
        assert!(page.has_more());

        let last = Page {
            items: vec![5],
            applied_limit: 2,
            offset: 4,
            total: 5,
        };
        assert!(!last.has_more());
    }
}
