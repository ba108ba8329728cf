//! The crawler facade: every operation behind one shared [`PageSource`].

use crate::batch::{BatchJob, BatchOrchestrator};
use crate::config::CrawlerConfig;
use crate::discovery::FeedDiscovery;
use crate::error::Result;
use crate::extract::Extractor;
use crate::feed::FeedReader;
use crate::fetcher::ArticleFetcher;
use crate::models::{ArticleResult, CrawlTarget, SearchQuery, SummaryResult};
use crate::search::QueryMatcher;
use crate::session::PageSource;
use crate::summary::SummaryService;

/// Wires the fetcher, orchestrator, discovery, search and summary
/// components together. One politeness pacer is shared by every call made
/// through the same crawler.
pub struct NewsCrawler<'a, S> {
    source: &'a S,
    config: CrawlerConfig,
    orchestrator: BatchOrchestrator<'a, S>,
}

impl<'a, S: PageSource> NewsCrawler<'a, S> {
    pub fn new(source: &'a S, config: CrawlerConfig) -> Self {
        let fetcher = ArticleFetcher::new(
            source,
            Extractor::new(config.summary_sentences),
            config.min_text_chars,
        );
        let orchestrator = BatchOrchestrator::new(fetcher, config.policy.to_policy());
        Self {
            source,
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub async fn crawl(&self, target: &CrawlTarget) -> ArticleResult {
        self.orchestrator.run_one(target).await
    }

    pub async fn crawl_many(&self, targets: &[CrawlTarget]) -> Vec<ArticleResult> {
        self.orchestrator.run_targets(targets).await
    }

    pub async fn run_job(&self, job: BatchJob) -> Vec<ArticleResult> {
        self.orchestrator.run(job).await
    }

    pub async fn discover(&self, feed_url: &str, max_articles: usize) -> Result<Vec<ArticleResult>> {
        FeedDiscovery::new(FeedReader::new(self.source), &self.orchestrator)
            .discover(feed_url, max_articles)
            .await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleResult>> {
        QueryMatcher::new(
            FeedReader::new(self.source),
            &self.orchestrator,
            &self.config.default_feeds,
            self.config.feed_scan_limit,
        )
        .search(query)
        .await
    }

    pub async fn summarize(&self, target: &CrawlTarget, sentence_count: usize) -> SummaryResult {
        SummaryService::new(self.orchestrator.fetcher())
            .summarize(target, sentence_count)
            .await
    }
}
