//! The pager: a single-pass cursor over a paginated list
//!
//! A [`Pager`] yields the elements of every page in server order, fetching
//! the next page only when the current one is drained and the server said
//! more data exists. Blocking ([`Pager::advance`]) and async
//! ([`Pager::advance_async`]) consumers share one state machine; both feed
//! fetched pages through the same transition so their state cannot diverge.
//! [`Pager::next_page`] and [`Pager::next_page_async`] give the same cursor a
//! page at a time.
//!
//! State is only ever changed by a successful fetch. A transport error,
//! a malformed body, or a cancelled async fetch leaves the pager exactly as
//! it was, so the same advance can simply be called again.
//!
//! A page with `has_more = true` but no usable `next` cursor poisons the
//! pager: that advance and every later one fail with [`Error::Protocol`].

use super::types::PageEnvelope;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, Transport};
use crate::query::Filters;
use futures::Stream;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// What the next advance has to do
enum Step<T> {
    /// An element was buffered
    Ready(T),
    /// Buffer drained and the server has more
    Fetch,
    /// Buffer drained and the server has nothing more
    Exhausted,
}

/// What the next page-level call has to do
enum PageStep {
    Buffered,
    Fetch,
    Exhausted,
}

/// Lazy, forward-only cursor over a paginated collection.
///
/// Not internally synchronized; `advance` takes `&mut self`. The transport
/// handle is shared and may be used by other pagers at the same time.
pub struct Pager<T, Tr = HttpTransport> {
    transport: Arc<Tr>,
    /// `None` until the first page is applied
    page: Option<std::vec::IntoIter<T>>,
    page_len: usize,
    position: usize,
    next_url: String,
    has_more: bool,
    pages_fetched: usize,
    poisoned: Option<String>,
}

impl<T, Tr> Pager<T, Tr> {
    /// Create a pager starting at `url`. No request is made until the first
    /// advance.
    pub fn new(transport: Arc<Tr>, url: impl Into<String>) -> Self {
        Self {
            transport,
            page: None,
            page_len: 0,
            position: 0,
            next_url: url.into(),
            has_more: true,
            pages_fetched: 0,
            poisoned: None,
        }
    }

    /// Create a pager starting at `url` with `filters` encoded into its query
    pub fn with_filters(transport: Arc<Tr>, url: &str, filters: &Filters) -> Self {
        Self::new(transport, filters.apply_to(url))
    }

    /// Pagers are single-pass. Always fails with
    /// [`Error::UnsupportedOperation`].
    pub fn reset(&mut self) -> Result<()> {
        Err(Error::unsupported("pagers cannot be reset or re-used"))
    }

    /// Whether the server signalled more pages (true before the first fetch)
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// URL the next fetch will request
    pub fn next_url(&self) -> &str {
        &self.next_url
    }

    /// Index of the next element within the current page
    pub fn position(&self) -> usize {
        self.position
    }

    /// Size of the current page (0 before the first fetch)
    pub fn page_len(&self) -> usize {
        self.page_len
    }

    /// Elements left in the current page
    pub fn remaining_in_page(&self) -> usize {
        self.page.as_ref().map_or(0, ExactSizeIterator::len)
    }

    /// Number of pages applied so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether a page has been fetched yet
    pub fn is_started(&self) -> bool {
        self.page.is_some()
    }

    /// True once the last page is drained; no further fetch will happen
    pub fn is_exhausted(&self) -> bool {
        !self.has_more && self.remaining_in_page() == 0
    }

    /// True after a protocol violation
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn check_poisoned(&self) -> Result<()> {
        match &self.poisoned {
            Some(message) => Err(Error::protocol(message.clone())),
            None => Ok(()),
        }
    }

    fn step(&mut self) -> Result<Step<T>> {
        self.check_poisoned()?;

        if let Some(item) = self.page.as_mut().and_then(Iterator::next) {
            self.position += 1;
            return Ok(Step::Ready(item));
        }

        if self.has_more {
            Ok(Step::Fetch)
        } else {
            trace!("pager exhausted after {} pages", self.pages_fetched);
            Ok(Step::Exhausted)
        }
    }

    fn page_step(&self) -> Result<PageStep> {
        self.check_poisoned()?;
        if self.remaining_in_page() > 0 {
            Ok(PageStep::Buffered)
        } else if self.has_more {
            Ok(PageStep::Fetch)
        } else {
            Ok(PageStep::Exhausted)
        }
    }

    /// Move every element still buffered out of the current page
    fn drain_page(&mut self) -> Vec<T> {
        let items: Vec<T> = self
            .page
            .as_mut()
            .map(|page| page.by_ref().collect())
            .unwrap_or_default();
        self.position += items.len();
        items
    }

    /// The only place page state changes. Both fetch paths end here.
    fn apply_page(&mut self, page: PageEnvelope<T>) -> Result<()> {
        if page.has_more && !page.has_usable_next() {
            let message = format!(
                "page from {} has has_more=true but no next cursor",
                self.next_url
            );
            warn!("{}", message);
            self.poisoned = Some(message.clone());
            return Err(Error::protocol(message));
        }

        debug!(
            "applied page {} from {}: {} items, has_more={}",
            self.pages_fetched + 1,
            self.next_url,
            page.len(),
            page.has_more
        );

        self.page_len = page.data.len();
        self.page = Some(page.data.into_iter());
        self.position = 0;
        self.next_url = page.next;
        self.has_more = page.has_more;
        self.pages_fetched += 1;
        Ok(())
    }
}

impl<T, Tr> Pager<T, Tr>
where
    T: DeserializeOwned,
    Tr: Transport,
{
    /// Yield the next element, blocking on a fetch when the current page is
    /// drained.
    ///
    /// Returns `Ok(None)` only at true exhaustion. Empty pages that still
    /// have more behind them are skipped within the same call.
    pub fn advance(&mut self) -> Result<Option<T>> {
        loop {
            match self.step()? {
                Step::Ready(item) => return Ok(Some(item)),
                Step::Exhausted => return Ok(None),
                Step::Fetch => {
                    let page = self.transport.fetch_page(&self.next_url)?;
                    self.apply_page(page)?;
                }
            }
        }
    }

    /// Hand over the rest of the current page, fetching the next page first
    /// when the current one is drained.
    ///
    /// Unlike [`advance`](Pager::advance), empty pages are returned as they
    /// come (`Some(vec![])`). `Ok(None)` means the collection is exhausted.
    /// Element-level and page-level calls may be mixed freely.
    pub fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        match self.page_step()? {
            PageStep::Exhausted => return Ok(None),
            PageStep::Fetch => {
                let page = self.transport.fetch_page(&self.next_url)?;
                self.apply_page(page)?;
            }
            PageStep::Buffered => {}
        }
        Ok(Some(self.drain_page()))
    }

    /// Blocking iterator over the remaining elements.
    ///
    /// Ends after the first error; call [`advance`](Pager::advance) directly
    /// to retry from the same point.
    pub fn iter(&mut self) -> Iter<'_, T, Tr> {
        Iter {
            pager: self,
            halted: false,
        }
    }
}

impl<T, Tr> Pager<T, Tr>
where
    T: DeserializeOwned + Send,
    Tr: Transport,
{
    /// Async form of [`advance`](Pager::advance).
    ///
    /// If `cancel` fires before a fetch completes the call fails with
    /// [`Error::Cancelled`] and the pager is left as it was before that
    /// fetch. Serving already-buffered elements never suspends.
    pub async fn advance_async(&mut self, cancel: Option<&CancellationToken>) -> Result<Option<T>> {
        loop {
            match self.step()? {
                Step::Ready(item) => return Ok(Some(item)),
                Step::Exhausted => return Ok(None),
                Step::Fetch => {
                    let page = self
                        .transport
                        .fetch_page_cancellable(&self.next_url, cancel)
                        .await
                        .inspect_err(|e| {
                            if e.is_cancelled() {
                                debug!("fetch of {} cancelled", self.next_url);
                            }
                        })?;
                    self.apply_page(page)?;
                }
            }
        }
    }

    /// Async form of [`next_page`](Pager::next_page), with the same
    /// cancellation guarantee as [`advance_async`](Pager::advance_async).
    pub async fn next_page_async(
        &mut self,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<Vec<T>>> {
        match self.page_step()? {
            PageStep::Exhausted => return Ok(None),
            PageStep::Fetch => {
                let page = self
                    .transport
                    .fetch_page_cancellable(&self.next_url, cancel)
                    .await?;
                self.apply_page(page)?;
            }
            PageStep::Buffered => {}
        }
        Ok(Some(self.drain_page()))
    }

    /// Turn the pager into a stream of elements.
    ///
    /// Like [`iter`](Pager::iter), the stream ends after the first error.
    pub fn into_stream(self, cancel: Option<CancellationToken>) -> impl Stream<Item = Result<T>> {
        futures::stream::unfold(
            (self, cancel, false),
            |(mut pager, cancel, halted)| async move {
                if halted {
                    return None;
                }
                match pager.advance_async(cancel.as_ref()).await {
                    Ok(Some(item)) => Some((Ok(item), (pager, cancel, false))),
                    Ok(None) => None,
                    Err(e) => Some((Err(e), (pager, cancel, true))),
                }
            },
        )
    }
}

impl<T, Tr> std::fmt::Debug for Pager<T, Tr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("next_url", &self.next_url)
            .field("has_more", &self.has_more)
            .field("position", &self.position)
            .field("page_len", &self.page_len)
            .field("pages_fetched", &self.pages_fetched)
            .field("poisoned", &self.poisoned.is_some())
            .finish_non_exhaustive()
    }
}

/// Blocking iterator returned by [`Pager::iter`]
pub struct Iter<'a, T, Tr> {
    pager: &'a mut Pager<T, Tr>,
    halted: bool,
}

impl<T, Tr> Iterator for Iter<'_, T, Tr>
where
    T: DeserializeOwned,
    Tr: Transport,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        match self.pager.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.halted = true;
                None
            }
            Err(e) => {
                self.halted = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a, T, Tr> IntoIterator for &'a mut Pager<T, Tr>
where
    T: DeserializeOwned,
    Tr: Transport,
{
    type Item = Result<T>;
    type IntoIter = Iter<'a, T, Tr>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
