//! HTTP transport module
//!
//! Defines the [`Transport`] contract the pager fetches pages through, and
//! the reqwest-backed [`HttpTransport`] that implements it.
//!
//! # Features
//!
//! - **Blocking and async**: the same page fetch in both calling styles
//! - **Cancellation**: async fetches race a `CancellationToken`
//! - **JSON or XML**: bodies decoded by the [`decode`](crate::decode) module

mod client;
mod transport;

pub use client::{HttpTransport, HttpTransportConfig, HttpTransportConfigBuilder};
pub use transport::Transport;

#[cfg(test)]
mod tests;
