//! HTTP transport backed by reqwest
//!
//! Provides the production [`Transport`]:
//! - Async GET through `reqwest::Client`
//! - Blocking GET through `reqwest::blocking::Client`, built on first use
//! - Status classification and page decoding shared by both paths

use super::transport::Transport;
use crate::decode::{decode_page, PageFormat};
use crate::error::{Error, Result};
use crate::pagination::PageEnvelope;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL that relative paths are joined onto
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Body format of page responses
    pub format: PageFormat,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("recurly-pager/{}", env!("CARGO_PKG_VERSION")),
            format: PageFormat::Json,
        }
    }
}

impl HttpTransportConfig {
    /// Create a new config builder
    pub fn builder() -> HttpTransportConfigBuilder {
        HttpTransportConfigBuilder::default()
    }
}

/// Builder for HTTP transport config
#[derive(Default)]
pub struct HttpTransportConfigBuilder {
    config: HttpTransportConfig,
}

impl HttpTransportConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the page body format
    pub fn format(mut self, format: PageFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpTransportConfig {
        self.config
    }
}

/// Production transport over HTTP.
///
/// Holds no per-request state, so one instance can serve any number of
/// pagers at once.
pub struct HttpTransport {
    client: Client,
    blocking: OnceCell<reqwest::blocking::Client>,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Create a transport with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            blocking: OnceCell::new(),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// The blocking client must not be built or dropped on an async worker
    /// thread, so it is only created by the first blocking fetch.
    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        self.blocking.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(self.config.timeout)
                .user_agent(&self.config.user_agent)
                .build()
                .map_err(Error::Http)
        })
    }

    /// Shared tail of both fetch paths: classify the status, decode the body
    fn read_page<T: DeserializeOwned>(
        &self,
        url: &str,
        status: StatusCode,
        body: &str,
    ) -> Result<PageEnvelope<T>> {
        if !status.is_success() {
            warn!("GET {} failed with {}", url, status.as_u16());
            return Err(Error::transport(status.as_u16(), body));
        }

        let page = decode_page(self.config.format, body)?;
        debug!(
            "GET {} -> {} items, has_more={}",
            url,
            page.len(),
            page.has_more
        );
        Ok(page)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn fetch_page<T>(&self, url: &str) -> Result<PageEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let full_url = self.build_url(url);
        let mut req = self
            .blocking_client()?
            .get(&full_url)
            .header(ACCEPT, self.config.format.accept_header());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        debug!("GET {} (blocking)", full_url);
        let response = req.send()?;
        let status = response.status();
        let body = response.text()?;

        self.read_page(&full_url, status, &body)
    }

    async fn fetch_page_async<T>(&self, url: &str) -> Result<PageEnvelope<T>>
    where
        T: DeserializeOwned + Send,
    {
        let full_url = self.build_url(url);
        let mut req = self
            .client
            .get(&full_url)
            .header(ACCEPT, self.config.format.accept_header());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        debug!("GET {}", full_url);
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        self.read_page(&full_url, status, &body)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .field("blocking_ready", &self.blocking.get().is_some())
            .finish_non_exhaustive()
    }
}
