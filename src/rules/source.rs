//! Where rule feeds come from.
//!
//! A [`RuleSource`] only yields the raw feed body. Parsing and
//! normalization happen in [`RuleSet::from_slice`](super::RuleSet::from_slice)
//! so every source is held to the same feed contract.

use crate::cache::Cache;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for feed downloads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Supplies the raw bytes of a rule feed.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Human-readable location of the feed (URL or path).
    fn describe(&self) -> String;

    /// Fetches the feed body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedUnavailable`] when the feed cannot be retrieved.
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// Downloads the rule feed over HTTP(S).
pub struct HttpRuleSource {
    client: reqwest::Client,
    url: String,
    cache: Option<Cache>,
}

impl HttpRuleSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .user_agent(concat!("lockguard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::FeedUnavailable {
                feed: url.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url,
            cache: None,
        })
    }

    /// Serves the feed from `cache` while it is fresh and stores new
    /// downloads in it.
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn cache_key(&self) -> String {
        format!("feed_{}", self.url)
    }

    fn unavailable(&self, reason: impl Into<String>) -> Error {
        Error::FeedUnavailable {
            feed: self.url.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RuleSource for HttpRuleSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        if let Some(body) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get::<String>(&self.cache_key()))
        {
            tracing::debug!(url = %self.url, "using cached rule feed");
            return Ok(body.into_bytes());
        }

        tracing::debug!(url = %self.url, "downloading rule feed");
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?
            .to_vec();

        // Only well-formed feeds are cached so a bad deploy is retried next run.
        let is_feed = serde_json::from_slice::<serde_json::Value>(&body)
            .is_ok_and(|v| v.is_array());
        if let (Some(cache), true) = (&self.cache, is_feed) {
            if let Err(e) = cache.set(&self.cache_key(), &String::from_utf8_lossy(&body)) {
                tracing::debug!(error = %e, "failed to cache rule feed");
            }
        }

        Ok(body)
    }
}

/// Reads the rule feed from a local file.
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::FeedUnavailable {
                feed: self.describe(),
                reason: e.to_string(),
            })
    }
}
