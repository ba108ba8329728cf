//! Article summaries with a caller-chosen sentence budget.

use crate::error::CrawlError;
use crate::extract::nlp;
use crate::fetcher::ArticleFetcher;
use crate::models::{ArticleFailure, ArticleResult, ArticleSummary, CrawlTarget, SummaryResult};
use crate::session::PageSource;
use tracing::{info, instrument};

/// Keywords reported alongside a summary.
pub const MAX_SUMMARY_KEYWORDS: usize = 10;

pub struct SummaryService<'f, 'a, S> {
    fetcher: &'f ArticleFetcher<'a, S>,
}

impl<'f, 'a, S: PageSource> SummaryService<'f, 'a, S> {
    pub fn new(fetcher: &'f ArticleFetcher<'a, S>) -> Self {
        Self { fetcher }
    }

    /// Fetch `target` and reduce it to at most `sentence_count` sentences.
    ///
    /// Articles with fewer sentences are summarized by all of them.
    #[instrument(level = "info", skip_all, fields(url = %target.url, sentence_count = sentence_count))]
    pub async fn summarize(&self, target: &CrawlTarget, sentence_count: usize) -> SummaryResult {
        if sentence_count == 0 {
            let err = CrawlError::Validation("summary_length must be at least 1".to_string());
            return SummaryResult::Failure(ArticleFailure::new(target.url.clone(), &err));
        }

        let article = match self.fetcher.fetch(target).await {
            ArticleResult::Success(article) => article,
            ArticleResult::Failure(failure) => return SummaryResult::Failure(failure),
        };

        let sentences = nlp::summarize(&article.title, &article.text, &target.language, sentence_count);
        info!(sentences = sentences.len(), "Summarized article");

        let article = *article;
        SummaryResult::Success(ArticleSummary {
            url: article.url,
            title: article.title,
            summary: sentences.join(" "),
            keywords: article.keywords.into_iter().take(MAX_SUMMARY_KEYWORDS).collect(),
            authors: article.authors,
            publish_date: article.publish_date,
            top_image: article.top_image,
        })
    }
}
