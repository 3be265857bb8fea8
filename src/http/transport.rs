//! Transport contract
//!
//! The pager only needs one thing from the network layer: fetch the page at
//! a URL and hand it back typed. Retry, auth and pooling live behind this
//! trait, not in the pager.

use crate::error::{Error, Result};
use crate::pagination::PageEnvelope;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// Fetches pages for a [`Pager`](crate::pagination::Pager).
///
/// Implementations are shared read-only between pagers (behind an `Arc`),
/// so every method takes `&self` and must be safe to call concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch one page, blocking the calling thread until it arrives.
    ///
    /// Fails with [`Error::Transport`] on a non-success status and
    /// [`Error::Deserialization`] on a malformed body.
    fn fetch_page<T>(&self, url: &str) -> Result<PageEnvelope<T>>
    where
        T: DeserializeOwned;

    /// Fetch one page without blocking. Same failure modes as
    /// [`fetch_page`](Transport::fetch_page).
    async fn fetch_page_async<T>(&self, url: &str) -> Result<PageEnvelope<T>>
    where
        T: DeserializeOwned + Send;

    /// Fetch one page, abandoning the request if `cancel` fires first.
    ///
    /// A token that is already cancelled fails with [`Error::Cancelled`]
    /// without issuing a request.
    async fn fetch_page_cancellable<T>(
        &self,
        url: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<PageEnvelope<T>>
    where
        T: DeserializeOwned + Send,
    {
        let Some(token) = cancel else {
            return self.fetch_page_async(url).await;
        };

        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            result = self.fetch_page_async(url) => result,
        }
    }
}
