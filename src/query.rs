//! Filter-to-query encoding
//!
//! List endpoints take their filters as query parameters. The encoding is
//! applied once, when a pager is built, and is deterministic: keys are
//! emitted in alphabetical order so the same filters always produce the same
//! URL.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// A single filter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Plain string
    Str(String),
    /// Integer (e.g. `limit`)
    Int(i64),
    /// Boolean, encoded as `true`/`false`
    Bool(bool),
    /// Timestamp, encoded as RFC 3339 in UTC
    DateTime(DateTime<Utc>),
    /// Multiple values, comma-joined (e.g. `ids=a,b,c`)
    List(Vec<String>),
}

impl FilterValue {
    /// Render the value as it appears on the wire (before urlencoding)
    pub fn to_query_value(&self) -> String {
        match self {
            FilterValue::Str(s) => s.clone(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            FilterValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Named filter parameters for a list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    params: BTreeMap<String, FilterValue>,
}

impl Filters {
    /// Create an empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filter
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a filter in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Look up a filter
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.params.get(key)
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if there are no filters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encode as `k=v&k=v` with keys in alphabetical order
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, &value.to_query_value());
        }
        serializer.finish()
    }

    /// Append the encoded filters to `url`.
    ///
    /// Uses `?` unless the URL already carries a query, in which case `&`.
    /// An empty filter set returns the URL unchanged.
    pub fn apply_to(&self, url: &str) -> String {
        if self.is_empty() {
            return url.to_string();
        }

        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{}", self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (key, value) in iter {
            filters.insert(key, value);
        }
        filters
    }
}
