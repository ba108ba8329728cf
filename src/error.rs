//! Error taxonomy for crawling, feed reading and tool validation.
//!
//! Every component catches the errors it produces and folds them into the
//! failure variant of its result type (see [`crate::models::ArticleResult`]).
//! The only error that is allowed to stop the process is
//! [`CrawlError::Session`], raised when the transport session cannot be
//! established at start-up.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while fetching, parsing or validating a crawl request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("empty content: {0}")]
    EmptyContent(String),

    #[error("transport session is not open")]
    SessionNotReady,

    #[error("failed to establish transport session: {0}")]
    Session(String),
}

impl CrawlError {
    /// Short, stable classification of the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            CrawlError::Validation(_) => FailureKind::Validation,
            CrawlError::Network(_) => FailureKind::Network,
            CrawlError::Timeout(_) => FailureKind::Timeout,
            CrawlError::Parse(_) => FailureKind::Parse,
            CrawlError::EmptyContent(_) => FailureKind::EmptyContent,
            CrawlError::SessionNotReady | CrawlError::Session(_) => FailureKind::SessionNotReady,
        }
    }

    /// Classify a `reqwest` error the way callers see it.
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            CrawlError::Timeout(url.to_string())
        } else if e.is_connect() {
            CrawlError::Network(format!("connection failed for {url}: {e}"))
        } else if e.is_decode() || e.is_body() {
            CrawlError::Network(format!("failed to read body from {url}: {e}"))
        } else {
            CrawlError::Network(format!("request to {url} failed: {e}"))
        }
    }
}

impl From<url::ParseError> for CrawlError {
    fn from(e: url::ParseError) -> Self {
        CrawlError::Validation(format!("not a valid URL: {e}"))
    }
}

/// Cause classification reported in failure envelopes as `error_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    #[serde(rename = "validation_error")]
    Validation,
    #[serde(rename = "network_error")]
    Network,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "parse_error")]
    Parse,
    #[serde(rename = "empty_content")]
    EmptyContent,
    #[serde(rename = "session_not_ready")]
    SessionNotReady,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation_error",
            FailureKind::Network => "network_error",
            FailureKind::Timeout => "timeout",
            FailureKind::Parse => "parse_error",
            FailureKind::EmptyContent => "empty_content",
            FailureKind::SessionNotReady => "session_not_ready",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
