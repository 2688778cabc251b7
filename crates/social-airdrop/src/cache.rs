//! JSON file cache for cast pages, balance checks and airdrop progress
//!
//! Every stage checkpoints into its own document under the cache directory so
//! that a killed process can resume from the last fully written save. Documents
//! are pretty-printed JSON so they can be inspected (or deleted) by hand.
//!
//! Loads fail soft: a missing or unreadable document is treated as "nothing
//! cached". Saves go through a temp file and a rename so an interrupted write
//! never truncates the previous checkpoint.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::address;

/// Cache directory wrapper
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Use `dir` as the cache root. The directory is created on first save.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a logical cache name
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load a cached document, or `None` if it is absent or unreadable
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path(name);
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(cache = name, error = %e, "Failed to read cache file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(cache = name, error = %e, "Ignoring unparseable cache file");
                None
            }
        }
    }

    /// Write a document, replacing any previous version
    pub fn save<T: Serialize>(&self, name: &str, doc: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache directory: {}", self.dir.display()))?;

        let path = self.path(name);
        let tmp = self.dir.join(format!("{}.json.tmp", name));

        let json = serde_json::to_string_pretty(doc).with_context(|| format!("Failed to serialize cache {}", name))?;
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("Failed to move {} into place", tmp.display()))?;

        tracing::debug!(path = %path.display(), "Cache saved");
        Ok(())
    }

    /// Save, logging instead of failing. Used for intermediate checkpoints.
    pub fn checkpoint<T: Serialize>(&self, name: &str, doc: &T) {
        if let Err(e) = self.save(name, doc) {
            tracing::warn!(cache = name, error = %format!("{:#}", e), "Checkpoint save failed");
        }
    }
}

// =============================================================================
// Cache names
// =============================================================================

/// Collected casts for a search term, e.g. `$elizaOS` -> `casts__elizaOS`
pub fn casts_cache_name(search_text: &str) -> String {
    let sanitized: String = search_text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("casts_{}", sanitized)
}

/// Balance checks for one token, keyed on the lowercase address
pub fn balances_cache_name(token_address: &str) -> String {
    format!("balances_{}", address::normalize(token_address))
}

/// Paid addresses for one token, keyed on the lowercase address
pub fn progress_cache_name(token_address: &str) -> String {
    format!("airdrop_progress_{}", address::normalize(token_address))
}
