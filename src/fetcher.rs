//! Single-URL article fetching.
//!
//! [`ArticleFetcher::fetch`] downloads one page through a [`PageSource`],
//! runs the [`Extractor`] on it and folds every possible failure into an
//! [`ArticleResult`]. It never returns an error and never retries.

use crate::error::{CrawlError, Result};
use crate::extract::Extractor;
use crate::models::{Article, ArticleResult, CrawlTarget};
use crate::session::PageSource;
use crate::utils::parse_http_url;
use tracing::{info, instrument, warn};

/// Article bodies shorter than this many characters count as empty.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 50;

pub struct ArticleFetcher<'a, S> {
    source: &'a S,
    extractor: Extractor,
    min_text_chars: usize,
}

impl<'a, S: PageSource> ArticleFetcher<'a, S> {
    pub fn new(source: &'a S, extractor: Extractor, min_text_chars: usize) -> Self {
        Self {
            source,
            extractor,
            min_text_chars,
        }
    }

    /// Fetch and extract one article.
    #[instrument(level = "info", skip_all, fields(url = %target.url))]
    pub async fn fetch(&self, target: &CrawlTarget) -> ArticleResult {
        match self.try_fetch(target).await {
            Ok(article) => {
                info!(
                    title = %article.title,
                    chars = article.text.chars().count(),
                    "Fetched article"
                );
                ArticleResult::success(article)
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "Article fetch failed");
                ArticleResult::failure(target.url.clone(), &e)
            }
        }
    }

    async fn try_fetch(&self, target: &CrawlTarget) -> Result<Article> {
        parse_http_url(&target.url)?;
        let html = self.source.fetch_page(&target.url).await?;
        let extracted = self.extractor.extract(&html, &target.url, &target.language)?;

        let chars = extracted.text.trim().chars().count();
        if chars < self.min_text_chars {
            return Err(CrawlError::EmptyContent(format!(
                "article body has {chars} characters, need at least {}",
                self.min_text_chars
            )));
        }
        Ok(extracted.into_article(target.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::testing::{FakeSource, article_html};

    const URL: &str = "https://news.example.com/story";

    fn fetcher(source: &FakeSource) -> ArticleFetcher<'_, FakeSource> {
        ArticleFetcher::new(source, Extractor::default(), DEFAULT_MIN_TEXT_CHARS)
    }

    #[tokio::test]
    async fn test_fetch_success_single_request() {
        let source = FakeSource::new().with_page(
            URL,
            article_html(
                "Storm passes",
                &["The storm moved out to sea overnight, leaving flooded streets behind."],
            ),
        );
        let result = fetcher(&source).fetch(&CrawlTarget::new(URL)).await;

        let article = result.article().expect("success");
        assert_eq!(article.url, URL);
        assert_eq!(article.title, "Storm passes");
        assert!(article.text.contains("flooded streets"));
        assert_eq!(source.requests_for(URL), 1);
    }

    #[tokio::test]
    async fn test_short_body_is_empty_content() {
        let source = FakeSource::new().with_page(URL, article_html("Stub", &["Too short."]));
        let result = fetcher(&source).fetch(&CrawlTarget::new(URL)).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::EmptyContent));
        assert_eq!(result.url(), URL);
    }

    #[tokio::test]
    async fn test_network_failure_becomes_failure_result() {
        let source = FakeSource::new()
            .with_page_error(URL, CrawlError::Timeout(URL.to_string()));
        let result = fetcher(&source).fetch(&CrawlTarget::new(URL)).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(source.requests_for(URL), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_request() {
        let source = FakeSource::new();
        let result = fetcher(&source).fetch(&CrawlTarget::new("not a url")).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
        assert_eq!(result.url(), "not a url");
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_non_html_is_parse_error() {
        let source = FakeSource::new().with_page(URL, "just some plain text, no markup at all");
        let result = fetcher(&source).fetch(&CrawlTarget::new(URL)).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Parse));
    }
}
