//! # Tubelens SDK - The Kit
//!
//! Typed HTTP access to the Tubelens backend endpoints the client logic uses.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tubelens_sdk::HistoryClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tubelens_sdk::Error> {
//!     let client = HistoryClient::new("https://api.tubelens.app").with_token("secret");
//!
//!     let keywords = client.fetch_keywords(200).await?;
//!     println!("{} keywords in history", keywords.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoint
//!
//! ```text
//! GET {base}/api/history/keywords?limit=N
//! Authorization: Bearer <token>
//!
//! 200 {"keywords": [{"keyword": "...", "analysisId": "...", ...}]}
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub use tubelens_core::HistoryKeyword;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Client-side deadline for a history fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of keywords requested per fetch.
pub const DEFAULT_KEYWORD_LIMIT: usize = 200;

/// Path of the history keyword endpoint.
pub const KEYWORDS_PATH: &str = "/api/history/keywords";

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the Tubelens SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-2xx status.
    #[error("Server returned status {status}")]
    Status { status: u16 },

    /// The request did not finish before the deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// No bearer token is available, so no request was made.
    #[error("Not signed in")]
    Unauthenticated,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Body of the history keyword endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordsResponse {
    #[serde(default)]
    pub keywords: Vec<HistoryKeyword>,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the analysis-history keyword feed.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
    timeout: Duration,
}

impl HistoryClient {
    /// Create an anonymous client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Attach a bearer token, sent as `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Attach a token if one is available.
    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Override the per-request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch up to `limit` keywords from the signed-in user's history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without touching the network when no
    /// token is set, [`Error::Timeout`] past the deadline, [`Error::Status`] on
    /// non-2xx answers and [`Error::Json`] on a malformed body.
    pub async fn fetch_keywords(&self, limit: usize) -> Result<Vec<HistoryKeyword>, Error> {
        let Some(token) = self.token.as_deref() else {
            return Err(Error::Unauthenticated);
        };

        let url = format!("{}{}?limit={}", self.base_url, KEYWORDS_PATH, limit);
        debug!(%url, "fetching history keywords");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| self.classify(e))?;
        let mut parsed: KeywordsResponse = serde_json::from_str(&body)?;
        parsed.keywords.truncate(limit);

        debug!(count = parsed.keywords.len(), "history keywords received");
        Ok(parsed.keywords)
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Http(err)
        }
    }
}
