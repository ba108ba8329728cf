//! Command-line interface definitions for the news crawler.
//!
//! Global options tune the transport session and politeness policy and can
//! also come from environment variables. Each subcommand maps onto one tool;
//! `serve` runs the line-delimited JSON tool server on stdio.

use crate::config::CrawlerConfig;
use crate::error::Result;
use clap::{Parser, Subcommand};

/// Command-line arguments for the news crawler.
///
/// # Examples
///
/// ```sh
/// # One article
/// news_crawler crawl https://www.bbc.com/news/articles/example
///
/// # Search the default feeds, four fetches at a time
/// news_crawler --concurrency 4 search "interest rates" --max-results 3
///
/// # Tool server for an agent
/// news_crawler --config crawler.yaml serve
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "NEWS_CRAWLER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, global = true, env = "NEWS_CRAWLER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Maximum simultaneous article fetches
    #[arg(long, global = true, env = "NEWS_CRAWLER_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Minimum delay between request admissions, in milliseconds
    #[arg(long, global = true, env = "NEWS_CRAWLER_DELAY_MS")]
    pub delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Crawl one news article
    Crawl {
        url: String,
        #[arg(short, long, default_value = "en")]
        language: String,
    },
    /// Crawl several articles; results keep the input order
    CrawlMany {
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(short, long, default_value = "en")]
        language: String,
    },
    /// Crawl the articles listed in an RSS/Atom feed
    Discover {
        rss_url: String,
        #[arg(short, long, default_value_t = 10)]
        max_articles: usize,
    },
    /// Search feeds for a query and crawl the best matches
    Search {
        query: String,
        /// Feed to search; repeat for several. Defaults to the configured feeds.
        #[arg(short, long = "feed")]
        feeds: Vec<String>,
        #[arg(short, long, default_value_t = 5)]
        max_results: usize,
    },
    /// Summarize one article
    Summarize {
        url: String,
        #[arg(short, long, default_value_t = 5)]
        sentences: usize,
    },
    /// Serve tool calls as line-delimited JSON on stdin/stdout
    Serve,
    /// Print the tool definitions
    Tools,
}

impl Cli {
    /// Build the effective configuration: defaults, then the YAML file, then
    /// flags and environment variables.
    pub fn load_config(&self) -> Result<CrawlerConfig> {
        let mut config = match &self.config {
            Some(path) => CrawlerConfig::from_yaml_file(path)?,
            None => CrawlerConfig::default(),
        };
        if let Some(timeout) = self.timeout_secs {
            config.session.timeout_secs = timeout;
        }
        if let Some(user_agent) = &self.user_agent {
            config.session.user_agent = user_agent.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.policy.max_concurrency = concurrency;
        }
        if let Some(delay) = self.delay_ms {
            config.policy.delay_ms = delay;
        }
        config.validate()?;
        Ok(config)
    }
}
