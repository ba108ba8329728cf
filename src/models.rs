//! Data models shared by every crawling component.
//!
//! This module defines the values that flow through a single tool call:
//! - [`CrawlTarget`]: a URL plus language hint, the unit of work
//! - [`ArticleResult`]: the uniform success/failure record for one URL
//! - [`FeedItem`]: one entry read from an RSS/Atom feed
//! - [`SearchQuery`]: a cross-feed search request
//! - [`SummaryResult`]: the reduced record produced by the summary tool
//!
//! Results serialize to the JSON "envelope" handed back to callers: every
//! success carries `success: true`, every failure carries `url`,
//! `success: false` and `error`.

use crate::error::{CrawlError, FailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Language used when the caller does not supply one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A URL to crawl together with the language hint for text processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: String,
    pub language: String,
}

impl CrawlTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// A fully extracted news article.
///
/// The `rss_*` fields are only present when the article was reached through
/// a feed (discovery or search) and hold the feed's own view of the item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub text: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub top_image: Option<String>,
    pub images: Vec<String>,
    pub meta_description: Option<String>,
    pub meta_lang: Option<String>,
    pub meta_keywords: Vec<String>,
    pub canonical_link: Option<String>,
    pub meta_favicon: Option<String>,
    pub movies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_summary: Option<String>,
}

impl Article {
    /// Fill gaps left by extraction with the feed's own fields and attach
    /// the feed metadata verbatim.
    pub fn merge_feed_item(&mut self, item: &FeedItem) {
        if self.title.trim().is_empty() && !item.title.is_empty() {
            self.title = item.title.clone();
        }
        if self.publish_date.is_none() {
            self.publish_date = item.published;
        }
        if self.summary.trim().is_empty() {
            if let Some(summary) = &item.summary {
                self.summary = summary.clone();
            }
        }
        if !item.title.is_empty() {
            self.rss_title = Some(item.title.clone());
        }
        self.rss_published = item.published;
        self.rss_summary = item.summary.clone();
    }
}

/// Why a single URL could not be turned into an [`Article`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleFailure {
    pub url: String,
    pub error: String,
    pub error_kind: FailureKind,
}

impl ArticleFailure {
    pub fn new(url: impl Into<String>, error: &CrawlError) -> Self {
        Self {
            url: url.into(),
            error: error.to_string(),
            error_kind: error.kind(),
        }
    }
}

/// Outcome of crawling one URL. Exactly one variant is populated and the
/// URL is always available through [`ArticleResult::url`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleResult {
    Success(Box<Article>),
    Failure(ArticleFailure),
}

impl ArticleResult {
    pub fn success(article: Article) -> Self {
        ArticleResult::Success(Box::new(article))
    }

    pub fn failure(url: impl Into<String>, error: &CrawlError) -> Self {
        ArticleResult::Failure(ArticleFailure::new(url, error))
    }

    pub fn url(&self) -> &str {
        match self {
            ArticleResult::Success(article) => &article.url,
            ArticleResult::Failure(failure) => &failure.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ArticleResult::Success(_))
    }

    pub fn article(&self) -> Option<&Article> {
        match self {
            ArticleResult::Success(article) => Some(article.as_ref()),
            ArticleResult::Failure(_) => None,
        }
    }

    pub fn article_mut(&mut self) -> Option<&mut Article> {
        match self {
            ArticleResult::Success(article) => Some(article.as_mut()),
            ArticleResult::Failure(_) => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ArticleResult::Success(_) => None,
            ArticleResult::Failure(failure) => Some(failure.error_kind),
        }
    }
}

/// Flattens a result body next to its `success` flag.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    #[serde(flatten)]
    body: &'a T,
    success: bool,
}

impl Serialize for ArticleResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArticleResult::Success(article) => Envelope {
                body: article.as_ref(),
                success: true,
            }
            .serialize(serializer),
            ArticleResult::Failure(failure) => Envelope {
                body: failure,
                success: false,
            }
            .serialize(serializer),
        }
    }
}

/// One entry of an RSS/Atom feed, as published by the feed itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub link: String,
    pub title: String,
    pub published: Option<DateTime<Utc>>,
    /// Plain-text summary from the feed, not the extractor's summary.
    pub summary: Option<String>,
}

/// A search across several feeds.
///
/// `feeds: None` means "use the configured default feeds"; an explicit empty
/// list is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub feeds: Option<Vec<String>>,
    pub max_results: usize,
}

impl SearchQuery {
    pub const DEFAULT_MAX_RESULTS: usize = 5;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            feeds: None,
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_feeds(mut self, feeds: Vec<String>) -> Self {
        self.feeds = Some(feeds);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// The key points of an article as returned by the summary tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub top_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryResult {
    Success(ArticleSummary),
    Failure(ArticleFailure),
}

impl SummaryResult {
    pub fn url(&self) -> &str {
        match self {
            SummaryResult::Success(summary) => &summary.url,
            SummaryResult::Failure(failure) => &failure.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SummaryResult::Success(_))
    }
}

impl Serialize for SummaryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SummaryResult::Success(summary) => Envelope {
                body: summary,
                success: true,
            }
            .serialize(serializer),
            SummaryResult::Failure(failure) => Envelope {
                body: failure,
                success: false,
            }
            .serialize(serializer),
        }
    }
}
