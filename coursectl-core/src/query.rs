//! Query, cursor and page types shared by the listing component and data sources

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What the view is asking for: free-text search plus named multi-value filters.
///
/// Filters live in a `BTreeMap` so two queries built in different insertion
/// orders compare (and serialize) identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub search_term: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Vec<String>>,
}

impl Query {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            filters: BTreeMap::new(),
        }
    }

    /// Builder: set the values of one filter, replacing any previous values.
    /// An empty value list removes the filter.
    pub fn with_filter<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, values);
        }
        self
    }

    /// Values of a filter, empty when unset
    pub fn filter(&self, key: &str) -> &[String] {
        self.filters.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Search term with surrounding whitespace removed, `None` when blank
    pub fn term(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// Opaque continuation token marking where the next page begins
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// One page of results. `next_cursor == None` means the listing is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// A final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}
