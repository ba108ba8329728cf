//! Article extraction: raw page HTML in, normalized article fields out.
//!
//! [`html`] holds the per-field page heuristics, [`nlp`] the language-aware
//! keyword and summary scoring. [`Extractor`] ties both together.

pub mod html;
pub mod nlp;

use crate::error::{CrawlError, Result};
use crate::models::Article;
use crate::utils::parse_http_url;
use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::debug;

/// Everything the extractor could recover from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    pub text: String,
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
    pub keywords: Vec<String>,
    pub summary: String,
}

impl ExtractedArticle {
    pub fn into_article(self, url: impl Into<String>) -> Article {
        Article {
            url: url.into(),
            title: self.title,
            text: self.text,
            summary: self.summary,
            keywords: self.keywords,
            authors: self.authors,
            publish_date: self.publish_date,
            top_image: self.top_image,
            images: self.images,
            meta_description: self.meta_description,
            meta_lang: self.meta_lang,
            meta_keywords: self.meta_keywords,
            canonical_link: self.canonical_link,
            meta_favicon: self.meta_favicon,
            movies: self.movies,
            ..Article::default()
        }
    }
}

/// Stateless page extractor with fixed keyword and summary budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extractor {
    summary_sentences: usize,
    max_keywords: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Extractor {
    pub const MAX_KEYWORDS: usize = 10;

    pub fn new(summary_sentences: usize) -> Self {
        Self {
            summary_sentences,
            max_keywords: Self::MAX_KEYWORDS,
        }
    }

    /// Parse `raw_html` fetched from `url`. `language` selects the stop-word
    /// list used for keywords and the summary.
    pub fn extract(&self, raw_html: &str, url: &str, language: &str) -> Result<ExtractedArticle> {
        if raw_html.trim().is_empty() {
            return Err(CrawlError::EmptyContent(format!("empty page body for {url}")));
        }
        if !raw_html.contains('<') {
            return Err(CrawlError::Parse(format!("response for {url} is not HTML")));
        }
        let base = parse_http_url(url)?;
        let doc = Html::parse_document(raw_html);

        let title = html::title(&doc);
        let text = html::body_text(&doc);
        let keywords = nlp::keywords(&format!("{title}\n{text}"), language, self.max_keywords);
        let summary = nlp::summarize(&title, &text, language, self.summary_sentences).join(" ");

        let article = ExtractedArticle {
            authors: html::authors(&doc),
            publish_date: html::publish_date(&doc),
            top_image: html::top_image(&doc, &base),
            images: html::images(&doc, &base),
            meta_description: html::meta_description(&doc),
            meta_lang: html::meta_lang(&doc),
            meta_keywords: html::meta_keywords(&doc),
            canonical_link: html::canonical_link(&doc, &base),
            meta_favicon: html::favicon(&doc, &base),
            movies: html::movies(&doc, &base),
            title,
            text,
            keywords,
            summary,
        };
        debug!(
            title = %article.title,
            chars = article.text.chars().count(),
            authors = article.authors.len(),
            images = article.images.len(),
            "Extracted article"
        );
        Ok(article)
    }
}
