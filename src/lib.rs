//! # News Crawler
//!
//! Turns news article URLs and RSS/Atom feeds into normalized, structured
//! JSON results for calling agents.
//!
//! ## Features
//!
//! - Article extraction: title, body, bylines, dates, images, metadata,
//!   keywords and an extractive summary
//! - Batch crawling with a concurrency bound and a politeness delay, results
//!   in input order with per-URL failure isolation
//! - Feed discovery that hydrates feed entries with full article content
//! - Cross-feed search that ranks feed items before fetching any article
//! - A tool boundary with JSON schemas, served over line-delimited JSON
//!
//! ## Architecture
//!
//! [`session::Session`] owns the HTTP client and implements
//! [`session::PageSource`]. [`crawler::NewsCrawler`] wires the
//! [`fetcher`], [`batch`], [`feed`], [`discovery`], [`search`] and
//! [`summary`] components around one source; [`tools`] and [`server`]
//! expose them to agents.

pub mod batch;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetcher;
pub mod models;
pub mod search;
pub mod server;
pub mod session;
pub mod summary;
pub mod tools;
pub mod utils;

#[cfg(test)]
mod testing;

pub use crawler::NewsCrawler;
pub use error::{CrawlError, FailureKind, Result};
pub use session::{PageSource, Session};
