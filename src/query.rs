//! Page requests and responses.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// One complete request for a page of a collection.
///
/// Values are never patched in place: each `with_*` call returns a new
/// query that fully supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub search_term: String,
    pub filters: BTreeMap<String, String>,
}

impl PageQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.max(1),
            search_term: String::new(),
            filters: BTreeMap::new(),
        }
    }

    pub fn with_page(&self, page_number: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.max(1),
            ..self.clone()
        }
    }

    /// Whether `other` selects the same rows (page aside).
    pub fn same_collection(&self, other: &PageQuery) -> bool {
        self.page_size == other.page_size
            && self.search_term == other.search_term
            && self.filters == other.filters
    }

    /// New search term, back on page 1.
    pub fn with_search(&self, term: impl Into<String>) -> Self {
        Self {
            page_number: 1,
            search_term: term.into(),
            ..self.clone()
        }
    }

    /// Set (`Some`) or drop (`None`) one filter, back on page 1.
    pub fn with_filter(&self, key: impl Into<String>, value: Option<String>) -> Self {
        let mut filters = self.filters.clone();
        let key = key.into();
        match value {
            Some(value) => {
                filters.insert(key, value);
            }
            None => {
                filters.remove(&key);
            }
        }
        Self {
            page_number: 1,
            filters,
            ..self.clone()
        }
    }

    /// Query-string pairs: `page`, `page_size`, `search` when non-empty, then filters.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page_number.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if !self.search_term.is_empty() {
            params.push(("search".to_string(), self.search_term.clone()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<R> {
    pub items: Vec<R>,
    pub total_count: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageEnvelope<R> {
    Paginated {
        results: Vec<R>,
        #[serde(default)]
        count: Option<u64>,
    },
    Bare(Vec<R>),
}

impl<R: DeserializeOwned> PageResult<R> {
    /// Decode either `{ "results": [...], "count": n }` or a bare array.
    ///
    /// Decoding is all-or-nothing: one malformed item fails the whole page.
    pub fn decode(body: Value) -> Result<Self, TransportError> {
        let envelope: PageEnvelope<R> = serde_json::from_value(body)?;
        Ok(match envelope {
            PageEnvelope::Paginated { results, count } => {
                let total_count = count.unwrap_or(results.len() as u64);
                PageResult {
                    items: results,
                    total_count,
                }
            }
            PageEnvelope::Bare(items) => PageResult {
                total_count: items.len() as u64,
                items,
            },
        })
    }
}
