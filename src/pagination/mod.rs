//! Pagination module
//!
//! # Overview
//!
//! List endpoints return one page at a time as a [`PageEnvelope`]. The
//! [`Pager`] wraps the sequence of envelopes into a single forward-only
//! sequence of elements, consumable blocking (`advance`, `Iterator`) or
//! async (`advance_async`, `Stream`).

mod pager;
mod types;

pub use pager::{Iter, Pager};
pub use types::PageEnvelope;
