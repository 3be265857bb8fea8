//! API client facade
//!
//! Bundles a shared transport and hands out pagers for list endpoints.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpTransport, Transport};
use crate::pagination::Pager;
use crate::query::Filters;
use std::sync::Arc;
use tracing::debug;

/// Entry point for list requests.
///
/// Cloning is cheap; clones share the same transport.
pub struct Client<Tr = HttpTransport> {
    transport: Arc<Tr>,
}

impl Client<HttpTransport> {
    /// Create a client over HTTP from a validated config
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(config.transport_config())?;
        debug!("client ready for {}", config.base_url);
        Ok(Self::with_transport(Arc::new(transport)))
    }
}

impl<Tr> Client<Tr> {
    /// Create a client over an existing transport
    pub fn with_transport(transport: Arc<Tr>) -> Self {
        Self { transport }
    }

    /// The shared transport handle
    pub fn transport(&self) -> &Arc<Tr> {
        &self.transport
    }
}

impl<Tr: Transport> Client<Tr> {
    /// Build a pager over the list endpoint at `path`.
    ///
    /// Filters are encoded into the first request only; later pages follow
    /// the server's `next` cursor. No request is made until the pager is
    /// advanced.
    pub fn list<T>(&self, path: &str, filters: Option<&Filters>) -> Pager<T, Tr> {
        match filters {
            Some(filters) => Pager::with_filters(Arc::clone(&self.transport), path, filters),
            None => Pager::new(Arc::clone(&self.transport), path),
        }
    }
}

impl<Tr> Clone for Client<Tr> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<Tr: std::fmt::Debug> std::fmt::Debug for Client<Tr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .finish()
    }
}
