//! Runtime configuration for the crawler.
//!
//! Configuration is layered:
//! 1. Built-in defaults ([`CrawlerConfig::default`])
//! 2. An optional YAML file passed with `--config`
//! 3. Command-line flags / environment variables (see [`crate::cli`])
//!
//! # Example
//!
//! ```yaml
//! session:
//!   timeout_secs: 15
//! policy:
//!   max_concurrency: 4
//!   delay_ms: 500
//! default_feeds:
//!   - https://feeds.bbci.co.uk/news/rss.xml
//! ```

use crate::batch::BatchPolicy;
use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// User agent sent with every request; many news sites refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Feeds searched when the caller does not name any.
pub const DEFAULT_FEEDS: &[&str] = &[
    "http://rss.cnn.com/rss/edition.rss",
    "https://feeds.bbci.co.uk/news/rss.xml",
    "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
];

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Total per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_redirects: usize,
    /// Responses larger than this are rejected.
    pub max_body_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Concurrency and politeness settings, converted into a [`BatchPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub max_concurrency: usize,
    /// Minimum spacing between request admissions, in milliseconds.
    pub delay_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            delay_ms: 1000,
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> BatchPolicy {
        BatchPolicy::new(self.max_concurrency, Duration::from_millis(self.delay_ms))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub session: SessionConfig,
    pub policy: PolicyConfig,
    /// Article bodies shorter than this many characters count as empty.
    pub min_text_chars: usize,
    /// Sentence budget for the auto summary attached to every article.
    pub summary_sentences: usize,
    /// How many items per feed the search tool looks at before ranking.
    pub feed_scan_limit: usize,
    pub default_feeds: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            policy: PolicyConfig::default(),
            min_text_chars: 50,
            summary_sentences: 5,
            feed_scan_limit: 50,
            default_feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CrawlerConfig {
    /// Load configuration from a YAML file. Missing keys keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CrawlError::Validation(format!(
                "cannot read config {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let config = Self::from_yaml_str(&raw)?;
        info!("Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: CrawlerConfig = serde_yaml::from_str(raw)
            .map_err(|e| CrawlError::Validation(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall or hammer origin servers.
    pub fn validate(&self) -> Result<()> {
        if self.policy.max_concurrency == 0 {
            return Err(CrawlError::Validation(
                "policy.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.session.timeout_secs == 0 {
            return Err(CrawlError::Validation(
                "session.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.summary_sentences == 0 {
            return Err(CrawlError::Validation(
                "summary_sentences must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
