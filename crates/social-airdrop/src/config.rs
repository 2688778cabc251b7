//! Configuration for the airdrop pipeline and sender

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;
use crate::dedupe::SpamFilter;

// =============================================================================
// File-based Configuration (airdrop.toml)
// =============================================================================

/// Configuration loaded from airdrop.toml. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub rpc: Option<RpcConfig>,
    #[serde(default)]
    pub filter: Option<FilterConfig>,
    #[serde(default)]
    pub pacing: Option<PacingConfig>,
}

/// RPC endpoint pool
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// Ordered endpoint URLs. The first one is used for sending transfers.
    pub endpoints: Vec<String>,
}

/// Bot/spam heuristic thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Accounts with a FID above this... (default: 1,000,000)
    #[serde(default = "default_max_fid")]
    pub max_fid: u64,
    /// ...and fewer followers than this are skipped (default: 5)
    #[serde(default = "default_min_followers")]
    pub min_followers: u64,
}

/// Pauses between external calls, in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    #[serde(default = "default_error_delay_ms")]
    pub error_delay_ms: u64,
    #[serde(default = "default_balance_check_delay_ms")]
    pub balance_check_delay_ms: u64,
    #[serde(default = "default_transfer_delay_ms")]
    pub transfer_delay_ms: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_max_fid() -> u64 {
    constants::SPAM_MAX_FID
}

fn default_min_followers() -> u64 {
    constants::SPAM_MIN_FOLLOWERS
}

fn default_page_delay_ms() -> u64 {
    constants::PAGE_DELAY_MS
}

fn default_rate_limit_delay_ms() -> u64 {
    constants::RATE_LIMIT_DELAY_MS
}

fn default_error_delay_ms() -> u64 {
    constants::SEARCH_ERROR_DELAY_MS
}

fn default_balance_check_delay_ms() -> u64 {
    constants::BALANCE_CHECK_DELAY_MS
}

fn default_transfer_delay_ms() -> u64 {
    constants::TRANSFER_DELAY_MS
}

fn default_backoff_base_ms() -> u64 {
    constants::BACKOFF_BASE_MS
}

fn default_backoff_max_ms() -> u64 {
    constants::BACKOFF_MAX_MS
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the file if it exists, otherwise fall back to built-in defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| {
            "Invalid airdrop config. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (strings vs numbers)\n\
             - rpc.endpoints must be a list of URLs"
        })
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Pauses and backoff bounds used by every network-facing stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Between successful search pages
    pub page_delay: Duration,
    /// After an HTTP 429 from the search API
    pub rate_limit_delay: Duration,
    /// After any other search failure
    pub error_delay: Duration,
    /// After each on-chain balance check (not after cache hits)
    pub balance_check_delay: Duration,
    /// Between transfer submissions
    pub transfer_delay: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(constants::PAGE_DELAY_MS),
            rate_limit_delay: Duration::from_millis(constants::RATE_LIMIT_DELAY_MS),
            error_delay: Duration::from_millis(constants::SEARCH_ERROR_DELAY_MS),
            balance_check_delay: Duration::from_millis(constants::BALANCE_CHECK_DELAY_MS),
            transfer_delay: Duration::from_millis(constants::TRANSFER_DELAY_MS),
            backoff_base: Duration::from_millis(constants::BACKOFF_BASE_MS),
            backoff_max: Duration::from_millis(constants::BACKOFF_MAX_MS),
        }
    }
}

impl Pacing {
    /// No pauses at all (tests, local replays)
    pub fn none() -> Self {
        Self {
            page_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
            error_delay: Duration::ZERO,
            balance_check_delay: Duration::ZERO,
            transfer_delay: Duration::ZERO,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    /// Exponential backoff for a zero-based attempt: `min(base * 2^attempt, max)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.backoff_max)
    }

    fn from_file(pacing: &PacingConfig) -> Self {
        Self {
            page_delay: Duration::from_millis(pacing.page_delay_ms),
            rate_limit_delay: Duration::from_millis(pacing.rate_limit_delay_ms),
            error_delay: Duration::from_millis(pacing.error_delay_ms),
            balance_check_delay: Duration::from_millis(pacing.balance_check_delay_ms),
            transfer_delay: Duration::from_millis(pacing.transfer_delay_ms),
            backoff_base: Duration::from_millis(pacing.backoff_base_ms),
            backoff_max: Duration::from_millis(pacing.backoff_max_ms),
        }
    }
}

/// Main configuration struct with parsed values
#[derive(Debug, Clone)]
pub struct Config {
    /// Ordered RPC pool for balance checks; `rpc_endpoints[0]` signs and sends
    pub rpc_endpoints: Vec<String>,
    /// Bot/spam heuristic applied by the deduplicator and the exporter
    pub spam_filter: SpamFilter,
    pub pacing: Pacing,
    /// Directory holding cast, balance and progress documents
    pub cache_dir: PathBuf,
}

impl Config {
    /// Create config from file config and the cache directory chosen on the CLI
    pub fn from_file(file_config: &FileConfig, cache_dir: PathBuf) -> Result<Self> {
        let rpc_endpoints = match &file_config.rpc {
            Some(rpc) => {
                if rpc.endpoints.is_empty() {
                    anyhow::bail!("rpc.endpoints must list at least one URL");
                }
                for url in &rpc.endpoints {
                    if !(url.starts_with("http://") || url.starts_with("https://")) {
                        anyhow::bail!("Invalid RPC endpoint (expected http/https URL): {}", url);
                    }
                }
                rpc.endpoints.clone()
            }
            None => constants::BASE_RPC_URLS.iter().map(|s| s.to_string()).collect(),
        };

        let spam_filter = match &file_config.filter {
            Some(filter) => SpamFilter {
                max_fid: filter.max_fid,
                min_followers: filter.min_followers,
            },
            None => SpamFilter::default(),
        };

        let pacing = file_config.pacing.as_ref().map(Pacing::from_file).unwrap_or_default();

        Ok(Self {
            rpc_endpoints,
            spam_filter,
            pacing,
            cache_dir,
        })
    }

    /// Endpoint used for signing and sending transfers
    pub fn primary_rpc(&self) -> &str {
        // from_file guarantees at least one endpoint
        self.rpc_endpoints.first().map(String::as_str).unwrap_or(constants::BASE_RPC_URLS[0])
    }
}
