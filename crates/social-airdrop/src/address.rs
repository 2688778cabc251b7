//! EVM address helpers shared by the evaluator, exporter and sender
//!
//! Addresses travel through the pipeline as strings (they come from the social
//! API and from CSV files) and are only parsed into `alloy` types at the RPC
//! boundary. Comparisons and cache keys always use the lowercase form.

use crate::constants::NO_VERIFIED_ADDRESS;

/// `0x` followed by 40 hex digits (checksummed or not)
pub fn is_evm_address(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// True for the placeholder written for users without a verified wallet
pub fn is_sentinel(value: &str) -> bool {
    value == NO_VERIFIED_ADDRESS
}

/// Lowercase form used for equality and cache keys
pub fn normalize(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Balance cache key: `lowercase(address)_lowercase(token)`
pub fn balance_cache_key(address: &str, token_address: &str) -> String {
    format!("{}_{}", normalize(address), normalize(token_address))
}

/// First 10 characters for log lines
pub fn short(address: &str) -> &str {
    address.get(..10).unwrap_or(address)
}
