// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # recurly-pager
//!
//! Cursor-driven pagination over the list endpoints of a billing API.
//!
//! ## Features
//!
//! - **One cursor, two calling styles**: blocking `advance()` or async
//!   `advance_async()`, over the same state
//! - **Page boundaries hidden**: elements come out in server order, one at a
//!   time; empty intermediate pages are skipped
//! - **Safe to retry**: failed or cancelled fetches leave the pager untouched
//! - **JSON or XML** page bodies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recurly_pager::{Client, ClientConfig, Filters, Result};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new(&ClientConfig::new("https://v3.example.com"))?;
//!
//!     let filters = Filters::new().with("limit", 200_i64).with("state", "active");
//!     let mut accounts = client.list::<Value>("/accounts", Some(&filters));
//!
//!     while let Some(account) = accounts.advance_async(None).await? {
//!         println!("{account}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                          Pager<T>                         │
//! │   advance() / advance_async(cancel) → Option<T>           │
//! │   Iterator<Item = Result<T>>   Stream<Item = Result<T>>   │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ apply_page(PageEnvelope<T>)
//! ┌──────────────┬──────────────┴───────────┬─────────────────┐
//! │    Query     │        Transport         │     Decode      │
//! ├──────────────┼──────────────────────────┼─────────────────┤
//! │ Filters      │ fetch_page (blocking)    │ JSON            │
//! │ FilterValue  │ fetch_page_async         │ XML             │
//! │              │ fetch_page_cancellable   │                 │
//! └──────────────┴──────────────────────────┴─────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
#[allow(missing_docs)]
pub mod error;

/// Filter-to-query encoding
pub mod query;

/// Page body decoders (JSON, XML)
pub mod decode;

/// Transport contract and HTTP implementation
pub mod http;

/// Page envelope and the pager
pub mod pagination;

/// Client configuration
pub mod config;

/// Client facade
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use config::ClientConfig;
pub use decode::PageFormat;
pub use error::{Error, Result};
pub use http::{HttpTransport, HttpTransportConfig, Transport};
pub use pagination::{PageEnvelope, Pager};
pub use query::{FilterValue, Filters};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
