//! Feed discovery: read a feed, then crawl the articles it links to.

use crate::batch::BatchOrchestrator;
use crate::error::Result;
use crate::feed::FeedReader;
use crate::models::{ArticleResult, CrawlTarget, FeedItem};
use crate::session::PageSource;
use tracing::{info, instrument};

pub struct FeedDiscovery<'o, 'a, S> {
    reader: FeedReader<'a, S>,
    orchestrator: &'o BatchOrchestrator<'a, S>,
}

impl<'o, 'a, S: PageSource> FeedDiscovery<'o, 'a, S> {
    pub fn new(reader: FeedReader<'a, S>, orchestrator: &'o BatchOrchestrator<'a, S>) -> Self {
        Self {
            reader,
            orchestrator,
        }
    }

    /// Crawl the first `max_articles` entries of `feed_url`, in feed order.
    ///
    /// Article failures stay in the output; a feed that cannot be fetched or
    /// parsed fails the whole call.
    #[instrument(level = "info", skip_all, fields(url = %feed_url, max_articles = max_articles))]
    pub async fn discover(&self, feed_url: &str, max_articles: usize) -> Result<Vec<ArticleResult>> {
        if max_articles == 0 {
            return Ok(Vec::new());
        }
        self.orchestrator
            .pacer()
            .admit(self.orchestrator.policy().delay())
            .await;
        let items = self.reader.read(feed_url, max_articles).await?;
        if items.is_empty() {
            info!("Feed has no entries");
            return Ok(Vec::new());
        }
        let results = hydrate(self.orchestrator, &items).await;
        info!(
            articles = results.len(),
            successful = results.iter().filter(|r| r.is_success()).count(),
            "Discovered articles"
        );
        Ok(results)
    }
}

/// Crawl every item's link and fold the feed's own fields into each
/// successful article. Output order follows `items`.
pub async fn hydrate<S: PageSource>(
    orchestrator: &BatchOrchestrator<'_, S>,
    items: &[FeedItem],
) -> Vec<ArticleResult> {
    let targets: Vec<CrawlTarget> = items
        .iter()
        .map(|item| CrawlTarget::new(item.link.clone()))
        .collect();
    let mut results = orchestrator.run_targets(&targets).await;
    for (result, item) in results.iter_mut().zip(items) {
        if let Some(article) = result.article_mut() {
            article.merge_feed_item(item);
        }
    }
    results
}
