//! Page envelope type
//!
//! One page of a list response, as the server sends it.

use serde::{Deserialize, Deserializer};

/// A single page of a paginated list response.
///
/// Wire form: `{ "has_more": bool, "data": [T, ...], "next": "url-or-empty" }`.
/// `next` is opaque; it is only meaningful when `has_more` is true.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageEnvelope<T> {
    /// The server may have more pages after this one
    #[serde(default)]
    pub has_more: bool,

    /// Elements of this page, in server order
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    /// Cursor URL of the next page (`null` and missing read as empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub next: String,
}

impl<T> PageEnvelope<T> {
    /// Build a page that says more data follows at `next`
    pub fn more(data: Vec<T>, next: impl Into<String>) -> Self {
        Self {
            has_more: true,
            data,
            next: next.into(),
        }
    }

    /// Build the final page
    pub fn last(data: Vec<T>) -> Self {
        Self {
            has_more: false,
            data,
            next: String::new(),
        }
    }

    /// Number of elements in this page
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if this page carries no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `next` can be followed (non-blank)
    pub fn has_usable_next(&self) -> bool {
        !self.next.trim().is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
