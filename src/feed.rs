//! RSS/Atom feed reading on top of `feed-rs`.

use crate::error::{CrawlError, Result};
use crate::models::FeedItem;
use crate::session::PageSource;
use crate::utils::{collapse_whitespace, parse_http_url, strip_html};
use feed_rs::parser;
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

pub struct FeedReader<'a, S> {
    source: &'a S,
}

impl<'a, S: PageSource> FeedReader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Read at most `max_items` entries of the feed at `feed_url`, in
    /// document order.
    ///
    /// Entries without a link are skipped and repeated links keep their
    /// first occurrence. Any fetch or parse failure fails the whole read.
    #[instrument(level = "info", skip_all, fields(url = %feed_url, max_items = max_items))]
    pub async fn read(&self, feed_url: &str, max_items: usize) -> Result<Vec<FeedItem>> {
        if max_items == 0 {
            return Ok(Vec::new());
        }
        let base = parse_http_url(feed_url)?;
        let bytes = self.source.fetch_feed(feed_url).await?;
        let items = parse_items(&bytes, &base, max_items)?;
        info!(count = items.len(), "Read feed");
        Ok(items)
    }
}

/// Translate feed bytes into [`FeedItem`]s.
pub fn parse_items(bytes: &[u8], base: &Url, max_items: usize) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| CrawlError::Parse(format!("failed to parse feed {base}: {e}")))?;

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for entry in feed.entries {
        if items.len() >= max_items {
            break;
        }
        let Some(href) = entry.links.first().map(|l| l.href.trim().to_string()) else {
            debug!(id = %entry.id, "Skipping feed entry without link");
            continue;
        };
        let Ok(link) = base.join(&href).map(|u| u.to_string()) else {
            debug!(%href, "Skipping feed entry with unusable link");
            continue;
        };
        if !seen.insert(link.clone()) {
            debug!(%link, "Skipping duplicate feed entry");
            continue;
        }

        let summary = entry
            .summary
            .map(|s| strip_html(&s.content))
            .filter(|s| !s.is_empty());
        items.push(FeedItem {
            link,
            title: entry
                .title
                .map(|t| collapse_whitespace(&t.content))
                .unwrap_or_default(),
            published: entry.published.or(entry.updated),
            summary,
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSource, rss_feed, rss_item};
    use chrono::{TimeZone, Utc};

    const FEED: &str = "https://news.example.com/rss.xml";

    fn sample_feed() -> String {
        rss_feed(&[
            rss_item(
                "First &amp; foremost",
                "https://news.example.com/1",
                Some("Tue, 06 May 2025 14:00:00 GMT"),
                "&lt;p&gt;Lead &lt;b&gt;story&lt;/b&gt;&lt;/p&gt;",
            ),
            "<item><title>No link here</title><description>orphan</description></item>"
                .to_string(),
            rss_item("Second", "/2", None, ""),
            rss_item("Second again", "https://news.example.com/2", None, "dup"),
            rss_item("Third", "https://news.example.com/3", None, "third"),
        ])
    }

    #[tokio::test]
    async fn test_read_normalizes_items() {
        let source = FakeSource::new().with_feed(FEED, sample_feed());
        let items = FeedReader::new(&source).read(FEED, 10).await.unwrap();

        let links: Vec<_> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://news.example.com/1",
                "https://news.example.com/2",
                "https://news.example.com/3",
            ]
        );
        assert_eq!(items[0].title, "First & foremost");
        assert_eq!(items[0].summary.as_deref(), Some("Lead story"));
        assert_eq!(
            items[0].published,
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 14, 0, 0).unwrap())
        );
        assert_eq!(items[1].title, "Second");
        assert!(items[1].summary.is_none());
        assert!(items[1].published.is_none());
    }

    #[tokio::test]
    async fn test_read_truncates_in_order() {
        let source = FakeSource::new().with_feed(FEED, sample_feed());
        let items = FeedReader::new(&source).read(FEED, 2).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].link, "https://news.example.com/2");
    }

    #[tokio::test]
    async fn test_zero_items_makes_no_request() {
        let source = FakeSource::new();
        let items = FeedReader::new(&source).read(FEED, 0).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_malformed_feed_is_parse_error() {
        let source = FakeSource::new().with_feed(FEED, "<html><body>not a feed</body></html>");
        let err = FeedReader::new(&source).read(FEED, 5).await.unwrap_err();
        assert!(matches!(err, CrawlError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let source =
            FakeSource::new().with_feed_error(FEED, CrawlError::Network("HTTP 503".to_string()));
        let err = FeedReader::new(&source).read(FEED, 5).await.unwrap_err();
        assert!(matches!(err, CrawlError::Network(_)));
    }

    #[test]
    fn test_parse_atom_uses_updated_when_unpublished() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom test</title>
  <id>urn:test</id>
  <updated>2025-01-02T03:04:05Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:test:1</id>
    <link href="https://news.example.com/atom/1"/>
    <updated>2025-01-02T03:04:05Z</updated>
    <summary>Plain summary</summary>
  </entry>
</feed>"#;
        let base = Url::parse(FEED).unwrap();
        let items = parse_items(atom.as_bytes(), &base, 5).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom entry");
        assert_eq!(
            items[0].published,
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
        );
        assert_eq!(items[0].summary.as_deref(), Some("Plain summary"));
    }
}
