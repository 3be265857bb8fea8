//! Client configuration
//!
//! Settings for talking to the API, loaded from YAML or from `RECURLY_*`
//! environment variables, and converted into an [`HttpTransportConfig`].

use crate::decode::PageFormat;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpTransportConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable holding the API base URL
pub const ENV_BASE_URL: &str = "RECURLY_BASE_URL";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "RECURLY_TIMEOUT_SECS";
/// Environment variable holding the page format (`json` or `xml`)
pub const ENV_FORMAT: &str = "RECURLY_FORMAT";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for API requests
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Body format of list responses
    #[serde(default)]
    pub format: PageFormat,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("recurly-pager/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create a config with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            format: PageFormat::default(),
            headers: HashMap::new(),
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// Read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from any key lookup (the environment, or a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| Error::config(format!("{ENV_BASE_URL} is not set")))?;
        let mut config = Self::new(base_url);

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))
            })?;
        }

        if let Some(format) = lookup(ENV_FORMAT) {
            config.format = format.parse()?;
        }

        Ok(config)
    }

    /// Set the page format
    #[must_use]
    pub fn with_format(mut self, format: PageFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Check that the config can be used
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Transport settings for this config
    pub fn transport_config(&self) -> HttpTransportConfig {
        let mut builder = HttpTransportConfig::builder()
            .base_url(&self.base_url)
            .timeout(self.timeout())
            .user_agent(&self.user_agent)
            .format(self.format);

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }
}
