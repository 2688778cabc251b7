//! Farcaster cast search via the Neynar REST API
//!
//! Only the author fields the pipeline needs are decoded; everything else in
//! the payload is ignored. Casts are cached in this reduced form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants;

// =============================================================================
// Data model
// =============================================================================

/// A single cast returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
}

/// Cast author snapshot at search time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub fid: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub verified_addresses: VerifiedAddresses,
    #[serde(default)]
    pub pfp_url: Option<String>,
}

/// Wallets the account has cryptographically linked to its profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedAddresses {
    #[serde(default)]
    pub eth_addresses: Vec<String>,
    #[serde(default)]
    pub sol_addresses: Vec<String>,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CastPage {
    pub casts: Vec<Cast>,
    pub next_cursor: Option<String>,
}

/// Parameters for one page request
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    pub text: &'a str,
    pub limit: u32,
    pub cursor: Option<&'a str>,
}

// Raw response. Results normally sit under `result`, but older API versions
// returned them at the top level.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Option<SearchResult>,
    #[serde(default)]
    casts: Option<Vec<Cast>>,
    #[serde(default)]
    next: Option<NextCursor>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    casts: Vec<Cast>,
    #[serde(default)]
    next: Option<NextCursor>,
}

#[derive(Debug, Deserialize)]
struct NextCursor {
    #[serde(default)]
    cursor: Option<String>,
}

impl From<SearchResponse> for CastPage {
    fn from(response: SearchResponse) -> Self {
        let (nested_casts, nested_next) = match response.result {
            Some(result) => (Some(result.casts), result.next),
            None => (None, None),
        };

        let casts = match nested_casts {
            Some(casts) if !casts.is_empty() => casts,
            _ => response.casts.unwrap_or_default(),
        };

        let next_cursor = nested_next
            .and_then(|n| n.cursor)
            .or_else(|| response.next.and_then(|n| n.cursor))
            .filter(|c| !c.is_empty());

        CastPage { casts, next_cursor }
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl SearchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Bad or missing API key; retrying will not help
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Source of cast search pages
#[async_trait]
pub trait CastSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery<'_>) -> Result<CastPage, SearchError>;
}

#[async_trait]
impl<T: CastSearch> CastSearch for &T {
    async fn search(&self, query: &SearchQuery<'_>) -> Result<CastPage, SearchError> {
        (**self).search(query).await
    }
}

pub struct NeynarClient {
    client: reqwest::Client,
    api_key: String,
}

impl NeynarClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        // Explicit timeout so a stalled page counts as a failure instead of hanging
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl CastSearch for NeynarClient {
    async fn search(&self, query: &SearchQuery<'_>) -> Result<CastPage, SearchError> {
        let limit = query.limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query.text),
            ("limit", limit.as_str()),
            ("mode", constants::SEARCH_MODE),
            ("sort_type", constants::SEARCH_SORT),
        ];
        if let Some(cursor) = query.cursor {
            params.push(("cursor", cursor));
        }

        let url = reqwest::Url::parse_with_params(constants::NEYNAR_CAST_SEARCH_URL, &params)
            .map_err(|e| SearchError::Network(format!("invalid search URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .header("api_key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let text = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&text).map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(parsed.into())
    }
}
