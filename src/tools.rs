//! The tool boundary: named operations with JSON arguments and JSON results.
//!
//! Every tool call returns a JSON value, never an error. Bad arguments come
//! back as failure envelopes with `error_kind: "validation_error"`.

use crate::crawler::NewsCrawler;
use crate::error::CrawlError;
use crate::models::{ArticleResult, CrawlTarget, DEFAULT_LANGUAGE, SearchQuery};
use crate::session::PageSource;
use crate::utils::parse_http_url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

pub const CRAWL_NEWS_ARTICLE: &str = "crawl_news_article";
pub const EXTRACT_MULTIPLE_NEWS_ARTICLES: &str = "extract_multiple_news_articles";
pub const DISCOVER_NEWS_FROM_RSS: &str = "discover_news_from_rss";
pub const SEARCH_AND_EXTRACT_NEWS: &str = "search_and_extract_news";
pub const GET_NEWS_SUMMARY: &str = "get_news_summary";

pub const TOOL_NAMES: &[&str] = &[
    CRAWL_NEWS_ARTICLE,
    EXTRACT_MULTIPLE_NEWS_ARTICLES,
    DISCOVER_NEWS_FROM_RSS,
    SEARCH_AND_EXTRACT_NEWS,
    GET_NEWS_SUMMARY,
];

const DEFAULT_MAX_ARTICLES: i64 = 10;
const DEFAULT_MAX_RESULTS: i64 = SearchQuery::DEFAULT_MAX_RESULTS as i64;
const DEFAULT_SUMMARY_LENGTH: i64 = 5;

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_max_articles() -> i64 {
    DEFAULT_MAX_ARTICLES
}

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

fn default_summary_length() -> i64 {
    DEFAULT_SUMMARY_LENGTH
}

#[derive(Debug, Deserialize)]
struct CrawlArgs {
    url: String,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Debug, Deserialize)]
struct ExtractManyArgs {
    urls: Vec<Value>,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Debug, Deserialize)]
struct DiscoverArgs {
    rss_url: String,
    #[serde(default = "default_max_articles")]
    max_articles: i64,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    rss_feeds: Option<Vec<String>>,
    #[serde(default = "default_max_results")]
    max_results: i64,
}

#[derive(Debug, Deserialize)]
struct SummaryArgs {
    url: String,
    #[serde(default = "default_summary_length")]
    summary_length: i64,
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({ "success": false, "error": format!("failed to encode result: {e}") })
    })
}

fn failure(url: &str, error: &CrawlError) -> Value {
    to_json(&ArticleResult::failure(url, error))
}

/// Decode `arguments` into `T`; on failure report against whatever URL-ish
/// field the caller did send under `url_key`.
fn parse_args<T: DeserializeOwned>(arguments: &Value, url_key: &str) -> Result<T, Value> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments.clone()).map_err(|e| {
        let url = arguments
            .get(url_key)
            .and_then(Value::as_str)
            .unwrap_or_default();
        failure(url, &CrawlError::Validation(e.to_string()))
    })
}

fn count(value: i64, name: &str, allow_zero: bool) -> Result<usize, CrawlError> {
    if value < 0 || (value == 0 && !allow_zero) {
        let floor = if allow_zero { 0 } else { 1 };
        return Err(CrawlError::Validation(format!(
            "{name} must be at least {floor}, got {value}"
        )));
    }
    usize::try_from(value)
        .map_err(|_| CrawlError::Validation(format!("{name} is out of range: {value}")))
}

/// Run the tool `name` with `arguments`.
#[instrument(level = "info", skip(crawler, arguments))]
pub async fn call<S: PageSource>(crawler: &NewsCrawler<'_, S>, name: &str, arguments: Value) -> Value {
    let result = match name {
        CRAWL_NEWS_ARTICLE => crawl_news_article(crawler, &arguments).await,
        EXTRACT_MULTIPLE_NEWS_ARTICLES => extract_multiple_news_articles(crawler, &arguments).await,
        DISCOVER_NEWS_FROM_RSS => discover_news_from_rss(crawler, &arguments).await,
        SEARCH_AND_EXTRACT_NEWS => search_and_extract_news(crawler, &arguments).await,
        GET_NEWS_SUMMARY => get_news_summary(crawler, &arguments).await,
        unknown => {
            warn!(tool = unknown, "Unknown tool requested");
            return json!({ "success": false, "error": format!("Unknown tool: {unknown}") });
        }
    };
    let (Ok(value) | Err(value)) = result;
    info!(tool = name, "Tool call finished");
    value
}

async fn crawl_news_article<S: PageSource>(
    crawler: &NewsCrawler<'_, S>,
    arguments: &Value,
) -> Result<Value, Value> {
    let args: CrawlArgs = parse_args(arguments, "url")?;
    let target = CrawlTarget::new(args.url).with_language(args.language);
    Ok(to_json(&crawler.crawl(&target).await))
}

async fn extract_multiple_news_articles<S: PageSource>(
    crawler: &NewsCrawler<'_, S>,
    arguments: &Value,
) -> Result<Value, Value> {
    let args: ExtractManyArgs = parse_args(arguments, "")?;
    if args.urls.is_empty() {
        return Err(failure(
            "",
            &CrawlError::Validation("urls must contain at least one URL".to_string()),
        ));
    }

    // Non-string entries fail in place; the rest are crawled as one batch.
    let mut slots: Vec<Option<Value>> = Vec::with_capacity(args.urls.len());
    let mut targets = Vec::new();
    for entry in &args.urls {
        match entry.as_str() {
            Some(url) => {
                targets.push(CrawlTarget::new(url).with_language(args.language.clone()));
                slots.push(None);
            }
            None => slots.push(Some(failure(
                &entry.to_string(),
                &CrawlError::Validation(format!("expected a URL string, got {entry}")),
            ))),
        }
    }

    let mut crawled = crawler.crawl_many(&targets).await.into_iter();
    let results: Vec<Value> = slots
        .into_iter()
        .map(|slot| {
            slot.or_else(|| crawled.next().map(|r| to_json(&r)))
                .unwrap_or_else(|| failure("", &CrawlError::Network("missing result".to_string())))
        })
        .collect();
    Ok(Value::Array(results))
}

async fn discover_news_from_rss<S: PageSource>(
    crawler: &NewsCrawler<'_, S>,
    arguments: &Value,
) -> Result<Value, Value> {
    let args: DiscoverArgs = parse_args(arguments, "rss_url")?;
    let max_articles =
        count(args.max_articles, "max_articles", true).map_err(|e| failure(&args.rss_url, &e))?;
    let results = crawler
        .discover(&args.rss_url, max_articles)
        .await
        .map_err(|e| failure(&args.rss_url, &e))?;
    Ok(to_json(&results))
}

async fn search_and_extract_news<S: PageSource>(
    crawler: &NewsCrawler<'_, S>,
    arguments: &Value,
) -> Result<Value, Value> {
    let args: SearchArgs = parse_args(arguments, "")?;
    let max_results =
        count(args.max_results, "max_results", true).map_err(|e| failure("", &e))?;
    let mut query = SearchQuery::new(args.query).with_max_results(max_results);
    if let Some(feeds) = args.rss_feeds {
        if feeds.is_empty() {
            return Err(failure(
                "",
                &CrawlError::Validation("rss_feeds must contain at least one feed URL".to_string()),
            ));
        }
        if let Some((feed_url, e)) = feeds
            .iter()
            .find_map(|feed_url| parse_http_url(feed_url).err().map(|e| (feed_url, e)))
        {
            return Err(failure(feed_url, &e));
        }
        query = query.with_feeds(feeds);
    }
    let results = crawler.search(&query).await.map_err(|e| failure("", &e))?;
    Ok(to_json(&results))
}

async fn get_news_summary<S: PageSource>(
    crawler: &NewsCrawler<'_, S>,
    arguments: &Value,
) -> Result<Value, Value> {
    let args: SummaryArgs = parse_args(arguments, "url")?;
    let sentences =
        count(args.summary_length, "summary_length", false).map_err(|e| failure(&args.url, &e))?;
    let summary = crawler.summarize(&CrawlTarget::new(args.url), sentences).await;
    Ok(to_json(&summary))
}

/// Name, description and JSON input schema of every tool.
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": CRAWL_NEWS_ARTICLE,
            "description": "Extract and parse a single news article into structured fields",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "The URL of the news article to crawl" },
                    "language": { "type": "string", "description": "Language of the article", "default": DEFAULT_LANGUAGE }
                },
                "required": ["url"]
            }
        },
        {
            "name": EXTRACT_MULTIPLE_NEWS_ARTICLES,
            "description": "Extract multiple news articles at once, results in input order",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "urls": { "type": "array", "items": { "type": "string" }, "description": "List of URLs to crawl" },
                    "language": { "type": "string", "description": "Language of the articles", "default": DEFAULT_LANGUAGE }
                },
                "required": ["urls"]
            }
        },
        {
            "name": DISCOVER_NEWS_FROM_RSS,
            "description": "Discover news articles from an RSS/Atom feed and extract their content",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "rss_url": { "type": "string", "description": "URL of the RSS feed" },
                    "max_articles": { "type": "integer", "minimum": 0, "description": "Maximum number of articles to extract", "default": DEFAULT_MAX_ARTICLES }
                },
                "required": ["rss_url"]
            }
        },
        {
            "name": SEARCH_AND_EXTRACT_NEWS,
            "description": "Search for news across multiple RSS feeds and extract the best matches",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query to look for in news articles" },
                    "rss_feeds": { "type": "array", "items": { "type": "string" }, "description": "List of RSS feed URLs to search" },
                    "max_results": { "type": "integer", "minimum": 0, "description": "Maximum number of results to return", "default": DEFAULT_MAX_RESULTS }
                },
                "required": ["query"]
            }
        },
        {
            "name": GET_NEWS_SUMMARY,
            "description": "Get a summarized version of a news article with key points",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "URL of the news article" },
                    "summary_length": { "type": "integer", "minimum": 1, "description": "Number of sentences for the summary", "default": DEFAULT_SUMMARY_LENGTH }
                },
                "required": ["url"]
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, PolicyConfig};
    use crate::testing::{FakeSource, article_html, rss_feed, rss_item};

    const PAGE: &str = "https://news.example.com/harvest";
    const FEED: &str = "https://news.example.com/rss";
    const BODY: &str = "Farmers brought in a record harvest this year despite the late spring frost.";

    fn config() -> CrawlerConfig {
        CrawlerConfig {
            policy: PolicyConfig {
                max_concurrency: 2,
                delay_ms: 0,
            },
            default_feeds: vec![FEED.to_string()],
            ..CrawlerConfig::default()
        }
    }

    fn source() -> FakeSource {
        FakeSource::new()
            .with_page(PAGE, article_html("Record harvest", &[BODY]))
            .with_feed(
                FEED,
                rss_feed(&[rss_item("Record harvest", PAGE, None, "Farmers celebrate.")]),
            )
    }

    #[tokio::test]
    async fn test_crawl_success_envelope() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(&crawler, CRAWL_NEWS_ARTICLE, json!({ "url": PAGE })).await;
        assert_eq!(out["success"], true);
        assert_eq!(out["url"], PAGE);
        assert_eq!(out["title"], "Record harvest");
    }

    #[tokio::test]
    async fn test_crawl_unreachable_is_failure_envelope() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(
            &crawler,
            CRAWL_NEWS_ARTICLE,
            json!({ "url": "https://unreachable.example.invalid/x" }),
        )
        .await;
        assert_eq!(out["success"], false);
        assert_eq!(out["url"], "https://unreachable.example.invalid/x");
        assert_eq!(out["error_kind"], "network_error");
    }

    #[tokio::test]
    async fn test_missing_and_mistyped_arguments() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());

        let out = call(&crawler, CRAWL_NEWS_ARTICLE, json!({})).await;
        assert_eq!(out["success"], false);
        assert_eq!(out["error_kind"], "validation_error");

        let out = call(&crawler, GET_NEWS_SUMMARY, json!({ "url": PAGE, "summary_length": "five" })).await;
        assert_eq!(out["error_kind"], "validation_error");
        assert_eq!(out["url"], PAGE);

        let out = call(&crawler, GET_NEWS_SUMMARY, json!({ "url": PAGE, "summary_length": 0 })).await;
        assert_eq!(out["error_kind"], "validation_error");

        let out = call(&crawler, DISCOVER_NEWS_FROM_RSS, json!({ "rss_url": FEED, "max_articles": -1 })).await;
        assert_eq!(out["error_kind"], "validation_error");

        let out = call(&crawler, CRAWL_NEWS_ARTICLE, Value::Null).await;
        assert_eq!(out["success"], false);

        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(&crawler, "delete_everything", json!({})).await;
        assert_eq!(out, json!({ "success": false, "error": "Unknown tool: delete_everything" }));
    }

    #[tokio::test]
    async fn test_extract_multiple_keeps_positions() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(
            &crawler,
            EXTRACT_MULTIPLE_NEWS_ARTICLES,
            json!({ "urls": [PAGE, 42, "not a url", PAGE] }),
        )
        .await;

        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0]["success"], true);
        assert_eq!(items[1]["error_kind"], "validation_error");
        assert_eq!(items[1]["url"], "42");
        assert_eq!(items[2]["error_kind"], "validation_error");
        assert_eq!(items[2]["url"], "not a url");
        assert_eq!(items[3]["url"], PAGE);
        assert_eq!(items[3]["success"], true);
    }

    #[tokio::test]
    async fn test_extract_multiple_empty_list() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(&crawler, EXTRACT_MULTIPLE_NEWS_ARTICLES, json!({ "urls": [] })).await;
        assert_eq!(out["success"], false);
        assert_eq!(out["error_kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_discover_zero_is_empty_array() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(&crawler, DISCOVER_NEWS_FROM_RSS, json!({ "rss_url": FEED, "max_articles": 0 })).await;
        assert_eq!(out, json!([]));
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_discover_feed_failure_keyed_by_feed() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(
            &crawler,
            DISCOVER_NEWS_FROM_RSS,
            json!({ "rss_url": "https://news.example.com/missing.xml" }),
        )
        .await;
        assert_eq!(out["success"], false);
        assert_eq!(out["url"], "https://news.example.com/missing.xml");
    }

    #[tokio::test]
    async fn test_search_uses_default_feeds() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());

        let out = call(&crawler, SEARCH_AND_EXTRACT_NEWS, json!({ "query": "harvest" })).await;
        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["rss_title"], "Record harvest");

        let none = call(&crawler, SEARCH_AND_EXTRACT_NEWS, json!({ "query": "earthquake" })).await;
        assert_eq!(none, json!([]));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_feed_list() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());

        let out = call(
            &crawler,
            SEARCH_AND_EXTRACT_NEWS,
            json!({ "query": "harvest", "rss_feeds": [] }),
        )
        .await;

        assert_eq!(out["success"], false);
        assert_eq!(out["error_kind"], "validation_error");
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_search_rejects_non_url_feed() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());

        let out = call(
            &crawler,
            SEARCH_AND_EXTRACT_NEWS,
            json!({ "query": "harvest", "rss_feeds": [FEED, "not a url"] }),
        )
        .await;

        assert_eq!(out["success"], false);
        assert_eq!(out["url"], "not a url");
        assert_eq!(out["error_kind"], "validation_error");
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_summary_envelope() {
        let source = source();
        let crawler = NewsCrawler::new(&source, config());
        let out = call(&crawler, GET_NEWS_SUMMARY, json!({ "url": PAGE, "summary_length": 3 })).await;
        assert_eq!(out["success"], true);
        assert_eq!(out["summary"], BODY);
        assert!(out.get("text").is_none());
    }

    #[test]
    fn test_tool_definitions_cover_every_tool() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, TOOL_NAMES);
        for def in defs.as_array().unwrap() {
            assert_eq!(def["inputSchema"]["type"], "object");
            assert!(def["inputSchema"]["required"].as_array().is_some());
        }
    }
}
