//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::Client;
use crate::config::{ClientConfig, ENV_BASE_URL};
use crate::error::{Error, Result};
use crate::pagination::Pager;
use crate::query::{FilterValue, Filters};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::List {
                path,
                filters,
                limit,
                blocking,
            } => {
                let filters = filters
                    .iter()
                    .map(|f| parse_filter(f))
                    .collect::<Result<Filters>>()?;
                let config = self.load_config()?;

                if *blocking {
                    self.list_blocking(config, path.clone(), filters, *limit)
                        .await
                } else {
                    self.list_async(&config, path, &filters, *limit).await
                }
            }
        }
    }

    /// Load client config from the file flag, or the environment
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match (&self.cli.config, &self.cli.base_url) {
            (Some(path), _) => ClientConfig::from_file(path)?,
            (None, Some(base_url)) => ClientConfig::from_lookup(|key| {
                if key == ENV_BASE_URL {
                    Some(base_url.clone())
                } else {
                    std::env::var(key).ok()
                }
            })?,
            (None, None) => ClientConfig::from_env()?,
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Page through `path` with the async pager. Ctrl-C cancels the
    /// in-flight fetch.
    async fn list_async(
        &self,
        config: &ClientConfig,
        path: &str,
        filters: &Filters,
        limit: Option<usize>,
    ) -> Result<()> {
        let client = Client::new(config)?;
        let mut pager: Pager<Value> = client.list(path, Some(filters));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling page fetch");
                trigger.cancel();
            }
        });

        let mut count = 0;
        let result = loop {
            if limit.is_some_and(|max| count >= max) {
                break Ok(());
            }
            match pager.advance_async(Some(&cancel)).await {
                Ok(Some(item)) => {
                    print_item(self.cli.format, &item);
                    count += 1;
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        watcher.abort();

        info!(
            "Listed {} elements from {} pages",
            count,
            pager.pages_fetched()
        );
        result
    }

    /// Page through `path` with the blocking pager on a blocking thread
    async fn list_blocking(
        &self,
        config: ClientConfig,
        path: String,
        filters: Filters,
        limit: Option<usize>,
    ) -> Result<()> {
        let format = self.cli.format;

        // The blocking HTTP client has to live and die off the async workers.
        let (count, pages) = tokio::task::spawn_blocking(move || -> Result<(usize, usize)> {
            let client = Client::new(&config)?;
            let mut pager: Pager<Value> = client.list(&path, Some(&filters));

            let mut count = 0;
            for item in pager.iter().take(limit.unwrap_or(usize::MAX)) {
                print_item(format, &item?);
                count += 1;
            }
            Ok((count, pager.pages_fetched()))
        })
        .await
        .map_err(|e| Error::Other(format!("Blocking list task failed: {e}")))??;

        info!("Listed {} elements from {} pages", count, pages);
        Ok(())
    }
}

/// Parse a `key=value` filter argument.
///
/// `true`/`false` become booleans, integers become integers, and values
/// containing commas become lists; anything else is a string.
pub fn parse_filter(arg: &str) -> Result<(String, FilterValue)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| Error::config(format!("Filter '{arg}' must be KEY=VALUE")))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::config(format!("Filter '{arg}' has an empty key")));
    }

    let value = match value {
        "true" => FilterValue::Bool(true),
        "false" => FilterValue::Bool(false),
        v if v.contains(',') => {
            FilterValue::List(v.split(',').map(|s| s.trim().to_string()).collect())
        }
        v => v
            .parse::<i64>()
            .map_or_else(|_| FilterValue::Str(v.to_string()), FilterValue::Int),
    };

    Ok((key.to_string(), value))
}

/// Print one element
fn print_item(format: OutputFormat, item: &Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(item).unwrap_or_default());
        }
        OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
        }
    }
}
