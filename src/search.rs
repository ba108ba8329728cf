//! Cross-feed search: rank feed items against a query, then crawl only the
//! winners.
//!
//! Ranking uses the feed's own title and summary, so no article page is
//! fetched until the final candidates are known.

use crate::batch::BatchOrchestrator;
use crate::discovery::hydrate;
use crate::error::{CrawlError, Result};
use crate::extract::nlp;
use crate::feed::FeedReader;
use crate::models::{ArticleResult, FeedItem, SearchQuery};
use crate::session::PageSource;
use crate::utils::parse_http_url;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

const TITLE_WEIGHT: f64 = 2.0;
const SUMMARY_WEIGHT: f64 = 1.0;
const PHRASE_BONUS: f64 = 1.5;

/// A normalized search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    terms: Vec<String>,
    /// All query tokens joined by single spaces; only set for multi-word queries.
    phrase: Option<String>,
}

impl QueryTerms {
    /// Tokenize `query`, dropping stop words unless nothing else is left.
    pub fn parse(query: &str, language: &str) -> Self {
        let tokens = nlp::tokenize(query);
        let content: Vec<String> = tokens
            .iter()
            .filter(|t| !nlp::is_stop_word(t, language))
            .cloned()
            .collect();
        let terms = if content.is_empty() { tokens.clone() } else { content };
        let phrase = (tokens.len() > 1).then(|| tokens.join(" "));
        Self {
            terms: terms.into_iter().unique().collect(),
            phrase,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A feed item with its relevance score and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub item: FeedItem,
    pub score: f64,
    pub feed_index: usize,
    pub item_index: usize,
}

fn normalized(text: &str) -> (HashSet<String>, String) {
    let tokens = nlp::tokenize(text);
    let joined = tokens.join(" ");
    (tokens.into_iter().collect(), joined)
}

/// Relevance of `item` to `query`. Zero means "no match".
///
/// Each term found as a word in the title adds 2.0, in the feed summary
/// 1.0. A multi-word query found verbatim, on word boundaries, adds 1.5 to
/// an item that already matched at least one term.
pub fn score_item(query: &QueryTerms, item: &FeedItem) -> f64 {
    let (title_words, title_text) = normalized(&item.title);
    let (summary_words, summary_text) = normalized(item.summary.as_deref().unwrap_or_default());

    let mut score = 0.0;
    for term in &query.terms {
        if title_words.contains(term) {
            score += TITLE_WEIGHT;
        }
        if summary_words.contains(term) {
            score += SUMMARY_WEIGHT;
        }
    }
    if score == 0.0 {
        return 0.0;
    }
    if let Some(phrase) = &query.phrase {
        let phrase = format!(" {phrase} ");
        if format!(" {title_text} ").contains(&phrase) || format!(" {summary_text} ").contains(&phrase) {
            score += PHRASE_BONUS;
        }
    }
    score
}

/// Best first: score, then newer publish date (undated last), then feed
/// order, then position within the feed.
fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| match (a.item.published, b.item.published) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then(a.feed_index.cmp(&b.feed_index))
        .then(a.item_index.cmp(&b.item_index))
}

/// Score every item of every feed and return the ranked matches, one per
/// link.
pub fn rank_candidates(query: &QueryTerms, feeds: Vec<Vec<FeedItem>>) -> Vec<ScoredCandidate> {
    feeds
        .into_iter()
        .enumerate()
        .flat_map(|(feed_index, items)| {
            items
                .into_iter()
                .enumerate()
                .map(move |(item_index, item)| (feed_index, item_index, item))
        })
        .filter_map(|(feed_index, item_index, item)| {
            let score = score_item(query, &item);
            (score > 0.0).then_some(ScoredCandidate {
                item,
                score,
                feed_index,
                item_index,
            })
        })
        .sorted_by(rank)
        .unique_by(|c| c.item.link.clone())
        .collect()
}

pub struct QueryMatcher<'o, 'a, S> {
    reader: FeedReader<'a, S>,
    orchestrator: &'o BatchOrchestrator<'a, S>,
    default_feeds: &'o [String],
    feed_scan_limit: usize,
}

impl<'o, 'a, S: PageSource> QueryMatcher<'o, 'a, S> {
    pub fn new(
        reader: FeedReader<'a, S>,
        orchestrator: &'o BatchOrchestrator<'a, S>,
        default_feeds: &'o [String],
        feed_scan_limit: usize,
    ) -> Self {
        Self {
            reader,
            orchestrator,
            default_feeds,
            feed_scan_limit,
        }
    }

    /// Search the query's feeds (or the defaults) and crawl the top
    /// `max_results` matches, best first.
    #[instrument(level = "info", skip_all, fields(query = %query.query, max_results = query.max_results))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleResult>> {
        if query.query.trim().is_empty() {
            return Err(CrawlError::Validation("query must not be empty".to_string()));
        }
        if query.max_results == 0 {
            return Ok(Vec::new());
        }
        let terms = QueryTerms::parse(&query.query, crate::models::DEFAULT_LANGUAGE);
        if terms.is_empty() {
            return Err(CrawlError::Validation(format!(
                "query '{}' has no searchable words",
                query.query
            )));
        }

        let feeds = match query.feeds.as_deref() {
            None => self.default_feeds,
            Some([]) => {
                return Err(CrawlError::Validation(
                    "rss_feeds must contain at least one feed URL".to_string(),
                ));
            }
            Some(feeds) => {
                for feed_url in feeds {
                    parse_http_url(feed_url)?;
                }
                feeds
            }
        };
        let feed_items = self.read_feeds(feeds).await;

        let winners: Vec<FeedItem> = rank_candidates(&terms, feed_items)
            .into_iter()
            .take(query.max_results)
            .inspect(|c| debug!(link = %c.item.link, score = c.score, "Selected candidate"))
            .map(|c| c.item)
            .collect();
        info!(feeds = feeds.len(), winners = winners.len(), "Ranked feed items");

        if winners.is_empty() {
            return Ok(Vec::new());
        }
        Ok(hydrate(self.orchestrator, &winners).await)
    }

    /// Read every feed, in order. Feeds that fail are logged and skipped.
    async fn read_feeds(&self, feeds: &[String]) -> Vec<Vec<FeedItem>> {
        let policy = self.orchestrator.policy();
        stream::iter(feeds)
            .map(|feed_url| async move {
                self.orchestrator.pacer().admit(policy.delay()).await;
                match self.reader.read(feed_url, self.feed_scan_limit).await {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(url = %feed_url, error = %e, "Skipping feed");
                        Vec::new()
                    }
                }
            })
            .buffered(policy.max_concurrency())
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchPolicy;
    use crate::extract::Extractor;
    use crate::fetcher::{ArticleFetcher, DEFAULT_MIN_TEXT_CHARS};
    use crate::testing::{FakeSource, article_html, rss_feed, rss_item};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    const FEED_A: &str = "https://a.example.com/rss";
    const FEED_B: &str = "https://b.example.com/rss";
    const BODY: &str = "The article body is long enough to pass the minimum length check easily.";

    fn item(title: &str, link: &str, summary: Option<&str>, day: Option<u32>) -> FeedItem {
        FeedItem {
            link: link.to_string(),
            title: title.to_string(),
            published: day.map(|d| Utc.with_ymd_and_hms(2025, 5, d, 12, 0, 0).unwrap()),
            summary: summary.map(str::to_string),
        }
    }

    #[test]
    fn test_query_terms_drop_stop_words() {
        let terms = QueryTerms::parse("The Climate and the Ocean", "en");
        assert_eq!(terms.terms(), ["climate", "ocean"]);

        let only_stops = QueryTerms::parse("the the", "en");
        assert_eq!(only_stops.terms(), ["the"]);
        assert!(QueryTerms::parse("  !! ", "en").is_empty());
    }

    #[test]
    fn test_score_weights_title_over_summary() {
        let q = QueryTerms::parse("climate", "en");
        let in_title = item("Climate talks resume", "https://x/1", None, None);
        let in_summary = item("Talks resume", "https://x/2", Some("On climate."), None);
        let nowhere = item("Sports", "https://x/3", Some("Final score."), None);
        assert!(score_item(&q, &in_title) > score_item(&q, &in_summary));
        assert!(score_item(&q, &in_summary) > 0.0);
        assert_eq!(score_item(&q, &nowhere), 0.0);
    }

    #[test]
    fn test_phrase_bonus() {
        let q = QueryTerms::parse("interest rates", "en");
        let phrase = item("Interest rates rise", "https://x/1", None, None);
        let scattered = item("Rates rise on interest", "https://x/2", None, None);
        assert!(score_item(&q, &phrase) > score_item(&q, &scattered));
    }

    #[test]
    fn test_substring_hits_do_not_score() {
        let q = QueryTerms::parse("art show", "en");
        let unrelated = item("Start showing results", "https://x/1", Some("Restart the showroom."), None);
        assert_eq!(score_item(&q, &unrelated), 0.0);
        assert!(rank_candidates(&q, vec![vec![unrelated]]).is_empty());
    }

    #[test]
    fn test_phrase_bonus_needs_word_boundaries() {
        let q = QueryTerms::parse("art show", "en");
        let exact = item("Art show opens", "https://x/1", None, None);
        let glued = item("Art showcase and art", "https://x/2", None, None);
        assert_eq!(score_item(&q, &exact), 2.0 * TITLE_WEIGHT + PHRASE_BONUS);
        assert_eq!(score_item(&q, &glued), TITLE_WEIGHT);
    }

    #[test]
    fn test_rank_ties_prefer_newer_then_feed_order() {
        let q = QueryTerms::parse("election", "en");
        let feeds = vec![
            vec![
                item("Election undated", "https://a/1", None, None),
                item("Election older", "https://a/2", None, Some(1)),
            ],
            vec![
                item("Election newer", "https://b/1", None, Some(3)),
                item("Election older twin", "https://b/2", None, Some(1)),
                item("Election recap", "https://b/3", Some("election election"), Some(2)),
            ],
        ];
        let ranked: Vec<_> = rank_candidates(&q, feeds)
            .into_iter()
            .map(|c| c.item.link)
            .collect();
        assert_eq!(
            ranked,
            vec!["https://b/3", "https://b/1", "https://a/2", "https://b/2", "https://a/1"]
        );
    }

    #[test]
    fn test_rank_collapses_duplicate_links() {
        let q = QueryTerms::parse("vote", "en");
        let feeds = vec![
            vec![item("Vote today", "https://same/1", None, None)],
            vec![item("Vote today", "https://same/1", Some("vote count"), None)],
        ];
        let ranked = rank_candidates(&q, feeds);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].feed_index, 1);
    }

    fn search_source() -> FakeSource {
        let feed_a = rss_feed(&[
            rss_item("Budget vote delayed", "https://a.example.com/1", Some("Mon, 05 May 2025 09:00:00 GMT"), "Lawmakers argue."),
            rss_item("Weather warning", "https://a.example.com/2", None, "Storms ahead."),
            rss_item("Budget vote passes", "https://a.example.com/3", Some("Tue, 06 May 2025 09:00:00 GMT"), "The budget vote ends."),
        ]);
        let feed_b = rss_feed(&[
            rss_item("Football final", "https://b.example.com/1", None, "A late goal."),
            rss_item("Budget talks", "https://b.example.com/2", None, "Ahead of the vote."),
        ]);
        let mut source = FakeSource::new().with_feed(FEED_A, feed_a).with_feed(FEED_B, feed_b);
        for link in [
            "https://a.example.com/1",
            "https://a.example.com/2",
            "https://a.example.com/3",
            "https://b.example.com/1",
            "https://b.example.com/2",
        ] {
            source = source.with_page(link, article_html("Page", &[BODY]));
        }
        source
    }

    fn orchestrator(source: &FakeSource) -> BatchOrchestrator<'_, FakeSource> {
        BatchOrchestrator::new(
            ArticleFetcher::new(source, Extractor::default(), DEFAULT_MIN_TEXT_CHARS),
            BatchPolicy::new(2, Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_search_hydrates_only_winners_in_rank_order() {
        let source = search_source();
        let orch = orchestrator(&source);
        let defaults = vec![FEED_A.to_string(), FEED_B.to_string()];
        let matcher = QueryMatcher::new(FeedReader::new(&source), &orch, &defaults, 50);

        let results = matcher
            .search(&SearchQuery::new("budget vote").with_max_results(2))
            .await
            .unwrap();

        let urls: Vec<_> = results.iter().map(|r| r.url()).collect();
        assert_eq!(urls, vec!["https://a.example.com/3", "https://a.example.com/1"]);
        assert_eq!(source.requests_for("https://b.example.com/2"), 0);
        assert_eq!(source.requests_for("https://a.example.com/2"), 0);
        assert_eq!(source.requests_for("https://b.example.com/1"), 0);
        assert_eq!(
            results[0].article().unwrap().rss_title.as_deref(),
            Some("Budget vote passes")
        );
    }

    #[tokio::test]
    async fn test_search_skips_failing_feed() {
        let source = search_source();
        let orch = orchestrator(&source);
        let matcher = QueryMatcher::new(FeedReader::new(&source), &orch, &[], 50);
        let query = SearchQuery::new("football")
            .with_feeds(vec!["https://down.example.com/rss".to_string(), FEED_B.to_string()]);

        let results = matcher.search(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url(), "https://b.example.com/1");
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty() {
        let source = search_source();
        let orch = orchestrator(&source);
        let defaults = vec![FEED_A.to_string()];
        let matcher = QueryMatcher::new(FeedReader::new(&source), &orch, &defaults, 50);

        let results = matcher.search(&SearchQuery::new("volcano")).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(source.total_requests(), 1);
    }

    #[tokio::test]
    async fn test_explicit_empty_feed_list_is_rejected() {
        let source = search_source();
        let orch = orchestrator(&source);
        let defaults = vec![FEED_A.to_string()];
        let matcher = QueryMatcher::new(FeedReader::new(&source), &orch, &defaults, 50);

        let err = matcher
            .search(&SearchQuery::new("budget").with_feeds(Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::Validation(_)));
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_non_url_feed_is_rejected_before_any_request() {
        let source = search_source();
        let orch = orchestrator(&source);
        let matcher = QueryMatcher::new(FeedReader::new(&source), &orch, &[], 50);
        let query = SearchQuery::new("budget")
            .with_feeds(vec![FEED_A.to_string(), "not a url".to_string()]);

        let err = matcher.search(&query).await.unwrap_err();

        assert!(matches!(err, CrawlError::Validation(_)));
        assert_eq!(source.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_search_validation() {
        let source = search_source();
        let orch = orchestrator(&source);
        let matcher = QueryMatcher::new(FeedReader::new(&source), &orch, &[], 50);

        let err = matcher.search(&SearchQuery::new("   ")).await.unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));

        let none = matcher
            .search(&SearchQuery::new("budget").with_max_results(0))
            .await
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(source.total_requests(), 0);
    }
}
