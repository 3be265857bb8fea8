//! Decoder types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Format of a page response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// XML format
    Xml,
}

impl PageFormat {
    /// Value for the `Accept` request header
    pub fn accept_header(self) -> &'static str {
        match self {
            PageFormat::Json => "application/json",
            PageFormat::Xml => "application/xml",
        }
    }
}

impl FromStr for PageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(PageFormat::Json),
            "xml" => Ok(PageFormat::Xml),
            other => Err(Error::config(format!(
                "unknown page format '{other}' (expected json or xml)"
            ))),
        }
    }
}
