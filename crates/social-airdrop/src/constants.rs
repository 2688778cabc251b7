//! Constants for endpoints, defaults, pacing and checkpoint intervals

// =============================================================================
// Chain
// =============================================================================

/// Public Base mainnet RPC endpoints, tried round-robin by the balance oracle.
/// The first entry is also the endpoint used for sending transfers.
pub const BASE_RPC_URLS: [&str; 5] = [
    "https://base.llamarpc.com",
    "https://mainnet.base.org",
    "https://base.meowrpc.com",
    "https://base-mainnet.public.blastapi.io",
    "https://base.gateway.tenderly.co",
];

/// elizaOS token on Base
pub const DEFAULT_TOKEN_ADDRESS: &str = "0xea17df5cf6d172224892b5477a16acb111182478";

pub const DEFAULT_TICKER: &str = "elizaOS";

// =============================================================================
// Cast search API (Neynar)
// =============================================================================

pub const NEYNAR_CAST_SEARCH_URL: &str = "https://api.neynar.com/v2/farcaster/cast/search/";

/// Maximum page size accepted by the search endpoint
pub const SEARCH_PAGE_SIZE: u32 = 100;
pub const SEARCH_MODE: &str = "literal";
pub const SEARCH_SORT: &str = "desc_chron";

/// Consecutive non-rate-limit failures before pagination stops
pub const MAX_CONSECUTIVE_SEARCH_ERRORS: u32 = 3;

// =============================================================================
// Spam filter defaults
// =============================================================================

pub const SPAM_MAX_FID: u64 = 1_000_000;
pub const SPAM_MIN_FOLLOWERS: u64 = 5;

// =============================================================================
// Pacing (milliseconds)
// =============================================================================

pub const PAGE_DELAY_MS: u64 = 1_000;
pub const RATE_LIMIT_DELAY_MS: u64 = 10_000;
pub const SEARCH_ERROR_DELAY_MS: u64 = 3_000;
pub const BALANCE_CHECK_DELAY_MS: u64 = 1_000;
pub const TRANSFER_DELAY_MS: u64 = 2_000;
pub const BACKOFF_BASE_MS: u64 = 500;
pub const BACKOFF_MAX_MS: u64 = 10_000;

// =============================================================================
// Checkpoint intervals
// =============================================================================

pub const CAST_CHECKPOINT_PAGES: u32 = 10;
pub const BALANCE_CHECKPOINT_USERS: usize = 25;
pub const PROGRESS_CHECKPOINT_TRANSFERS: usize = 10;

// =============================================================================
// Files
// =============================================================================

pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_CONFIG_FILE: &str = "airdrop.toml";
pub const DEFAULT_DISTRIBUTION_FILE: &str = "airdrop_distribution.csv";
pub const DEFAULT_AIRDROP_AMOUNT: &str = "420";

/// Number of rows shown in dry-run and export previews
pub const PREVIEW_ROWS: usize = 5;

/// Placeholder wallet for users without a verified address
pub const NO_VERIFIED_ADDRESS: &str = "NO_VERIFIED_ADDRESS";
