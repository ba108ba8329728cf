//! In-memory [`PageSource`] used by unit tests across the crate.

use crate::error::{CrawlError, Result};
use crate::session::PageSource;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Serves canned pages and feeds, records every request.
///
/// Unknown URLs answer like a 404 does through the real session.
#[derive(Debug, Default)]
pub struct FakeSource {
    pages: HashMap<String, Result<String>>,
    feeds: HashMap<String, Result<Vec<u8>>>,
    latency: Duration,
    requests: Mutex<Vec<(String, Instant)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(html.into()));
        self
    }

    pub fn with_page_error(mut self, url: &str, error: CrawlError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    pub fn with_feed(mut self, url: &str, xml: impl Into<String>) -> Self {
        self.feeds.insert(url.to_string(), Ok(xml.into().into_bytes()));
        self
    }

    pub fn with_feed_error(mut self, url: &str, error: CrawlError) -> Self {
        self.feeds.insert(url.to_string(), Err(error));
        self
    }

    /// Make every fetch take `latency` so concurrent fetches overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }

    /// When each request started, in arrival order.
    pub fn request_instants(&self) -> Vec<Instant> {
        self.requests.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn serve<T: Clone>(&self, url: &str, table: &HashMap<String, Result<T>>) -> Result<T> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        table
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(CrawlError::Network(format!("HTTP 404 Not Found for {url}"))))
    }
}

impl PageSource for FakeSource {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.serve(url, &self.pages).await
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        self.serve(url, &self.feeds).await
    }
}

/// A small article page whose body is `paragraphs`.
pub fn article_html(title: &str, paragraphs: &[&str]) -> String {
    let body = paragraphs
        .iter()
        .map(|p| format!("<p>{p}</p>"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "<html lang=\"en\"><head><title>{title}</title></head>\
         <body><article><h1>{title}</h1>\n{body}\n</article></body></html>"
    )
}

/// One RSS `<item>`. `pub_date` is RFC 2822.
pub fn rss_item(title: &str, link: &str, pub_date: Option<&str>, description: &str) -> String {
    let date = pub_date
        .map(|d| format!("<pubDate>{d}</pubDate>"))
        .unwrap_or_default();
    format!(
        "<item><title>{title}</title><link>{link}</link>{date}\
         <description>{description}</description></item>"
    )
}

pub fn rss_feed(items: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>Test feed</title>\
         <link>https://news.example.com/</link><description>Test</description>\
         {}</channel></rss>",
        items.concat()
    )
}
