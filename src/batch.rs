//! Bounded-concurrency, order-preserving batch crawling.
//!
//! A [`BatchOrchestrator`] drives the [`ArticleFetcher`] over a list of
//! targets. At most `max_concurrency` fetches are in flight and successive
//! admissions are spaced by the policy delay. Output position `i` always
//! belongs to input target `i`, whatever order the fetches finish in.

use crate::error::CrawlError;
use crate::fetcher::ArticleFetcher;
use crate::models::{ArticleResult, CrawlTarget};
use crate::session::PageSource;
use crate::utils::parse_http_url;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument};

/// Concurrency bound and politeness delay for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    max_concurrency: usize,
    delay: Duration,
}

impl BatchPolicy {
    /// A concurrency of zero is raised to one.
    pub fn new(max_concurrency: usize, delay: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            delay,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(1))
    }
}

/// Ordered targets plus the policy to crawl them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub targets: Vec<CrawlTarget>,
    pub policy: BatchPolicy,
}

impl BatchJob {
    pub fn new(targets: Vec<CrawlTarget>, policy: BatchPolicy) -> Self {
        Self { targets, policy }
    }
}

/// Spaces request admissions by a minimum delay.
///
/// The first admission goes through immediately. Waiters queue on the mutex,
/// so admissions are serialized even when many fetches are pending.
#[derive(Debug, Default)]
pub struct Pacer {
    last_admission: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn admit(&self, delay: Duration) {
        let mut last = self.last_admission.lock().await;
        if let Some(prev) = *last {
            if !delay.is_zero() {
                sleep_until(prev + delay).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Crawls batches of targets through one shared [`ArticleFetcher`].
///
/// The pacer lives as long as the orchestrator, so spacing also holds
/// across consecutive jobs.
pub struct BatchOrchestrator<'a, S> {
    fetcher: ArticleFetcher<'a, S>,
    policy: BatchPolicy,
    pacer: Pacer,
}

impl<'a, S: PageSource> BatchOrchestrator<'a, S> {
    pub fn new(fetcher: ArticleFetcher<'a, S>, policy: BatchPolicy) -> Self {
        Self {
            fetcher,
            policy,
            pacer: Pacer::new(),
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    pub fn fetcher(&self) -> &ArticleFetcher<'a, S> {
        &self.fetcher
    }

    /// The admission pacer, shared with feed reads made on behalf of a batch.
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Crawl one target, waiting for the pacer like any batch member.
    pub async fn run_one(&self, target: &CrawlTarget) -> ArticleResult {
        self.paced_fetch(target, self.policy.delay()).await
    }

    /// Targets that fail URL validation never reach the network, so they
    /// skip the pacer.
    async fn paced_fetch(&self, target: &CrawlTarget, delay: Duration) -> ArticleResult {
        if parse_http_url(&target.url).is_ok() {
            self.pacer.admit(delay).await;
        }
        self.fetcher.fetch(target).await
    }

    /// Crawl `targets` with the orchestrator's own policy.
    pub async fn run_targets(&self, targets: &[CrawlTarget]) -> Vec<ArticleResult> {
        self.run_with(targets, self.policy).await
    }

    /// Crawl every target of `job`. Returns one result per target, in input
    /// order, after all fetches have finished.
    pub async fn run(&self, job: BatchJob) -> Vec<ArticleResult> {
        self.run_with(&job.targets, job.policy).await
    }

    #[instrument(
        level = "info",
        skip_all,
        fields(
            targets = targets.len(),
            max_concurrency = policy.max_concurrency(),
            delay = ?policy.delay()
        )
    )]
    async fn run_with(&self, targets: &[CrawlTarget], policy: BatchPolicy) -> Vec<ArticleResult> {
        if targets.is_empty() {
            return Vec::new();
        }

        let completed: Vec<(usize, ArticleResult)> = stream::iter(targets.iter().enumerate())
            .map(|(index, target)| async move {
                debug!(index, url = %target.url, "Dispatching fetch");
                (index, self.paced_fetch(target, policy.delay()).await)
            })
            .buffer_unordered(policy.max_concurrency())
            .collect()
            .await;

        let mut slots: Vec<Option<ArticleResult>> = vec![None; targets.len()];
        for (index, result) in completed {
            slots[index] = Some(result);
        }

        let results: Vec<ArticleResult> = slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| {
                    ArticleResult::failure(
                        target.url.clone(),
                        &CrawlError::Network("fetch produced no result".to_string()),
                    )
                })
            })
            .collect();

        let ok = results.iter().filter(|r| r.is_success()).count();
        info!(
            total = results.len(),
            successful = ok,
            failed = results.len() - ok,
            "Completed batch"
        );
        results
    }
}
