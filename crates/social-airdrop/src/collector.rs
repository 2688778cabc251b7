//! Stage 1: collect every cast that matches a search term
//!
//! Pages are fetched sequentially with a pause between them. Progress is
//! checkpointed to the cast cache every few pages so an interrupted run still
//! leaves something usable behind; a later run with caching enabled returns
//! the cached casts without touching the API.
//!
//! Failure handling:
//! - 401: stop immediately (bad API key), keep what was collected
//! - 429: wait and retry the same page; never counts as a failure
//! - anything else: wait and retry; give up after a few consecutive failures

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::cache::{CacheStore, casts_cache_name};
use crate::config::Pacing;
use crate::constants;
use crate::neynar::{Cast, CastSearch, SearchQuery};

/// Cast cache document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastCacheDoc {
    pub casts: Vec<Cast>,
    pub timestamp: String,
    pub search_text: String,
    pub page_count: u32,
    /// False for intermediate checkpoints and for runs that stopped early
    #[serde(default)]
    pub complete: bool,
}

/// Why pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Served from the cast cache
    Cached,
    /// Empty page or no next cursor
    Exhausted,
    /// HTTP 401 from the search API
    Unauthorized,
    /// Too many consecutive non-rate-limit failures
    TooManyErrors,
}

/// Result of a collection run
#[derive(Debug, Clone)]
pub struct Collection {
    pub casts: Vec<Cast>,
    pub pages: u32,
    pub stop: StopReason,
}

impl Collection {
    /// True when the result may be missing casts
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::Unauthorized | StopReason::TooManyErrors)
    }
}

pub struct CastCollector<S> {
    search: S,
    store: CacheStore,
    pacing: Pacing,
}

impl<S: CastSearch> CastCollector<S> {
    pub fn new(search: S, store: CacheStore, pacing: Pacing) -> Self {
        Self { search, store, pacing }
    }

    /// Collect all casts for `search_text`, from cache when allowed
    pub async fn collect(&self, search_text: &str, use_cache: bool) -> Collection {
        let cache_name = casts_cache_name(search_text);

        if use_cache
            && let Some(cached) = self.store.load::<CastCacheDoc>(&cache_name)
            && !cached.casts.is_empty()
        {
            println!("\n📦 Loaded {} casts from cache", cached.casts.len());
            println!("   Cached at: {}", cached.timestamp);
            println!("   Use --no-cache to fetch fresh data");
            if !cached.complete {
                tracing::warn!(cache = %cache_name, "Cached casts come from an incomplete run");
            }
            return Collection {
                pages: cached.page_count,
                casts: cached.casts,
                stop: StopReason::Cached,
            };
        }

        tracing::info!(search_text, "Searching casts");

        // A complete document on disk is only ever replaced by another complete one
        let keep_existing = self
            .store
            .load::<CastCacheDoc>(&cache_name)
            .is_some_and(|doc| doc.complete);

        let mut casts: Vec<Cast> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages: u32 = 0;
        let mut consecutive_errors: u32 = 0;

        let stop = loop {
            let query = SearchQuery {
                text: search_text,
                limit: constants::SEARCH_PAGE_SIZE,
                cursor: cursor.as_deref(),
            };

            match self.search.search(&query).await {
                Ok(page) => {
                    if page.casts.is_empty() {
                        tracing::info!("No more results");
                        break StopReason::Exhausted;
                    }

                    pages += 1;
                    consecutive_errors = 0;
                    let added = page.casts.len();
                    casts.extend(page.casts);
                    tracing::info!(page = pages, added, total = casts.len(), "Fetched page");

                    if pages % constants::CAST_CHECKPOINT_PAGES == 0 && !keep_existing {
                        self.store
                            .checkpoint(&cache_name, &cache_doc(search_text, &casts, pages, false));
                        tracing::info!(pages, casts = casts.len(), "Progress saved");
                    }

                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break StopReason::Exhausted,
                    }

                    sleep(self.pacing.page_delay).await;
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::error!(error = %e, "Unauthorized (401): check NEYNAR_API_KEY");
                    break StopReason::Unauthorized;
                }
                Err(e) if e.is_rate_limited() => {
                    tracing::warn!(
                        wait_secs = self.pacing.rate_limit_delay.as_secs(),
                        "Rate limit exceeded, waiting"
                    );
                    sleep(self.pacing.rate_limit_delay).await;
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(page = pages + 1, error = %e, "Error fetching page");

                    if consecutive_errors >= constants::MAX_CONSECUTIVE_SEARCH_ERRORS {
                        tracing::error!(consecutive_errors, "Too many consecutive errors, stopping");
                        break StopReason::TooManyErrors;
                    }

                    sleep(self.pacing.error_delay).await;
                }
            }
        };

        println!("\n✓ Found {} total casts across {} pages", casts.len(), pages);

        let complete = stop == StopReason::Exhausted;
        if !complete && (casts.is_empty() || keep_existing) {
            tracing::warn!(cache = %cache_name, ?stop, "Search stopped early; leaving the cast cache as it was");
        } else if let Err(e) = self
            .store
            .save(&cache_name, &cache_doc(search_text, &casts, pages, complete))
        {
            tracing::warn!(error = %format!("{:#}", e), "Failed to save cast cache");
        }

        Collection { casts, pages, stop }
    }
}

fn cache_doc(search_text: &str, casts: &[Cast], pages: u32, complete: bool) -> CastCacheDoc {
    CastCacheDoc {
        casts: casts.to_vec(),
        timestamp: Utc::now().to_rfc3339(),
        search_text: search_text.to_string(),
        page_count: pages,
        complete,
    }
}
