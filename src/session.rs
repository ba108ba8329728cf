//! The transport session: one reusable HTTP client shared by every fetch.
//!
//! A [`Session`] starts closed. [`Session::open`] builds the pooled
//! `reqwest::Client` with the configured timeout and browser-like user agent,
//! [`Session::close`] drops it again. Fetching through a closed session fails
//! with [`CrawlError::SessionNotReady`].
//!
//! Components never talk to `reqwest` directly; they go through the
//! [`PageSource`] trait so tests can substitute an in-memory source.

use crate::config::SessionConfig;
use crate::error::{CrawlError, Result};
use crate::utils::parse_http_url;
use reqwest::{Client, Response};
use std::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Anything that can retrieve raw page and feed content.
pub trait PageSource {
    /// Fetch an HTML page and decode it to text.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Fetch a feed document as raw bytes; the feed parser sniffs encoding.
    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>>;
}

/// Shared outbound HTTP session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    client: RwLock<Option<Client>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Build the pooled client. Opening an open session is a no-op.
    #[instrument(level = "info", skip_all)]
    pub fn open(&self) -> Result<()> {
        let mut guard = self
            .client
            .write()
            .map_err(|_| CrawlError::Session("session lock poisoned".to_string()))?;
        if guard.is_some() {
            debug!("Session already open");
            return Ok(());
        }

        let client = Client::builder()
            .user_agent(&self.config.user_agent)
            .timeout(self.config.timeout())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .build()
            .map_err(|e| CrawlError::Session(e.to_string()))?;

        *guard = Some(client);
        info!(
            timeout_secs = self.config.timeout_secs,
            max_redirects = self.config.max_redirects,
            "Transport session opened"
        );
        Ok(())
    }

    /// Release pooled connections. Safe to call on a session never opened.
    pub fn close(&self) {
        match self.client.write() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    info!("Transport session closed");
                }
            }
            Err(_) => warn!("Session lock poisoned while closing"),
        }
    }

    pub fn is_open(&self) -> bool {
        self.client.read().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Clone the pooled client out of the lock; `Client` is an `Arc` inside.
    fn client(&self) -> Result<Client> {
        let guard = self.client.read().map_err(|_| CrawlError::SessionNotReady)?;
        guard.clone().ok_or(CrawlError::SessionNotReady)
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let client = self.client()?;
        parse_http_url(url)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| CrawlError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Network(format!("HTTP {status} for {url}")));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.config.max_body_bytes {
                return Err(CrawlError::Parse(format!(
                    "response too large ({len} bytes) for {url}"
                )));
            }
        }

        Ok(response)
    }

    fn check_size(&self, url: &str, len: usize) -> Result<()> {
        if len > self.config.max_body_bytes {
            return Err(CrawlError::Parse(format!(
                "response too large ({len} bytes) for {url}"
            )));
        }
        Ok(())
    }

    /// Read the body chunk by chunk, giving up as soon as it passes
    /// `max_body_bytes`.
    async fn read_body(&self, url: &str, mut response: Response) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CrawlError::from_reqwest(url, &e))?
        {
            self.check_size(url, body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

impl PageSource for Session {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        let body = self.read_body(url, response).await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let body = self.read_body(url, response).await?;
        debug!(bytes = body.len(), "Fetched feed");
        Ok(body)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
