//! Stage 3: decide which users are eligible for the airdrop
//!
//! A user is eligible when none of their verified wallets holds the token, or
//! when they have no verified wallet at all. Balance answers are memoised in
//! the balance cache keyed by `address_token`, so re-running over the same
//! users never repeats an on-chain check.

use anyhow::{Context, Result};
use chrono::Utc;
use csv::{ReaderBuilder, Trim, Writer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

use crate::address;
use crate::cache::{CacheStore, balances_cache_name};
use crate::config::Pacing;
use crate::constants;
use crate::dedupe::UniqueUser;
use crate::oracle::{BalanceOracle, BalanceQuery, Holding};

// =============================================================================
// Data model
// =============================================================================

/// Classification written to the eligibility CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "NO_ADDRESS")]
    NoAddress,
    #[serde(rename = "NO_TOKEN")]
    NoToken,
    #[serde(rename = "HOLDS_TOKEN")]
    HoldsToken,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::NoAddress => "NO_ADDRESS",
            Reason::NoToken => "NO_TOKEN",
            Reason::HoldsToken => "HOLDS_TOKEN",
        }
    }

    /// Whether a record with this reason gets paid
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Reason::HoldsToken)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRecord {
    pub user: UniqueUser,
    /// First verified wallet, or the `NO_VERIFIED_ADDRESS` sentinel
    pub wallet_address: String,
    pub holds_token: bool,
    pub reason: Reason,
}

/// Balance cache document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceCacheDoc {
    #[serde(default)]
    pub balances: BTreeMap<String, bool>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub token_address: String,
    #[serde(default)]
    pub total_checks: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub users_checked: usize,
    pub cache_hits: usize,
    pub new_checks: usize,
    /// On-chain checks that exhausted every endpoint
    pub unknown_checks: usize,
    pub holders: usize,
    pub no_address: usize,
    pub eligible: usize,
}

// =============================================================================
// Evaluator
// =============================================================================

pub struct EligibilityEvaluator<Q> {
    oracle: BalanceOracle<Q>,
    store: CacheStore,
    check_delay: Duration,
}

impl<Q: BalanceQuery> EligibilityEvaluator<Q> {
    pub fn new(oracle: BalanceOracle<Q>, store: CacheStore, pacing: &Pacing) -> Self {
        Self {
            oracle,
            store,
            check_delay: pacing.balance_check_delay,
        }
    }

    /// Classify every user; holders are left out of the returned records
    pub async fn evaluate(
        &self,
        users: &[UniqueUser],
        token_address: &str,
        use_cache: bool,
    ) -> (Vec<EligibilityRecord>, EvaluationStats) {
        let cache_name = balances_cache_name(token_address);
        let mut balances = if use_cache {
            self.store
                .load::<BalanceCacheDoc>(&cache_name)
                .map(|doc| doc.balances)
                .unwrap_or_default()
        } else {
            BTreeMap::new()
        };
        if !balances.is_empty() {
            println!("📦 Loaded {} cached balance checks", balances.len());
        }

        println!("\n🔍 Checking {} holdings for {} users...", address::short(token_address), users.len());

        let mut records = Vec::new();
        let mut stats = EvaluationStats::default();

        for (i, user) in users.iter().enumerate() {
            stats.users_checked += 1;

            let Some(first_wallet) = user.verified_addresses.first() else {
                stats.no_address += 1;
                records.push(EligibilityRecord {
                    user: user.clone(),
                    wallet_address: constants::NO_VERIFIED_ADDRESS.to_string(),
                    holds_token: false,
                    reason: Reason::NoAddress,
                });
                continue;
            };

            let mut holds = false;
            for wallet in &user.verified_addresses {
                let key = address::balance_cache_key(wallet, token_address);
                let has_token = match balances.get(&key) {
                    Some(cached) => {
                        stats.cache_hits += 1;
                        *cached
                    }
                    None => {
                        let holding = self.oracle.check(wallet, token_address).await;
                        if holding == Holding::Unknown {
                            stats.unknown_checks += 1;
                        }
                        let has_token = holding.resolve(self.oracle.policy());
                        balances.insert(key, has_token);
                        stats.new_checks += 1;
                        sleep(self.check_delay).await;
                        has_token
                    }
                };

                if has_token {
                    holds = true;
                    break;
                }
            }

            if holds {
                stats.holders += 1;
                tracing::debug!(username = %user.username, "Already holds token");
            } else {
                records.push(EligibilityRecord {
                    user: user.clone(),
                    wallet_address: first_wallet.clone(),
                    holds_token: false,
                    reason: Reason::NoToken,
                });
            }

            if (i + 1) % constants::BALANCE_CHECKPOINT_USERS == 0 {
                self.store
                    .checkpoint(&cache_name, &balance_doc(&balances, token_address));
                tracing::info!(
                    checked = i + 1,
                    total = users.len(),
                    eligible = records.len(),
                    "Balance checks saved"
                );
            }
        }

        if let Err(e) = self.store.save(&cache_name, &balance_doc(&balances, token_address)) {
            tracing::warn!(error = %format!("{:#}", e), "Failed to save balance cache");
        }

        stats.eligible = records.len();
        if stats.unknown_checks > 0 {
            tracing::warn!(
                unknown = stats.unknown_checks,
                policy = ?self.oracle.policy(),
                "Some balance checks could not reach any RPC"
            );
        }
        tracing::info!(
            users = stats.users_checked,
            cache_hits = stats.cache_hits,
            new_checks = stats.new_checks,
            holders = stats.holders,
            eligible = stats.eligible,
            "Eligibility evaluated"
        );

        (records, stats)
    }
}

fn balance_doc(balances: &BTreeMap<String, bool>, token_address: &str) -> BalanceCacheDoc {
    BalanceCacheDoc {
        balances: balances.clone(),
        timestamp: Utc::now().to_rfc3339(),
        token_address: token_address.to_string(),
        total_checks: Some(balances.len()),
    }
}

// =============================================================================
// Eligibility CSV
// =============================================================================

/// One row of the eligibility CSV
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EligibilityRow {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Display Name")]
    pub display_name: String,
    #[serde(rename = "FID")]
    pub fid: u64,
    #[serde(rename = "Wallet Address")]
    pub wallet_address: String,
    #[serde(rename = "Reason")]
    pub reason: Reason,
    #[serde(rename = "Follower Count")]
    pub follower_count: u64,
}

/// Rows read from an eligibility CSV
#[derive(Debug, Default)]
pub struct EligibilityFile {
    pub rows: Vec<EligibilityRow>,
    /// Rows that could not be decoded
    pub malformed: usize,
}

/// Write eligibility records with the standard header
pub fn write_eligibility_csv(path: &Path, records: &[EligibilityRecord]) -> Result<()> {
    let mut wtr = Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record([
        "Username",
        "Display Name",
        "FID",
        "Wallet Address",
        "Reason",
        "Follower Count",
    ])?;

    for record in records {
        wtr.write_record([
            record.user.username.as_str(),
            record.user.display_name.as_str(),
            &record.user.fid.to_string(),
            record.wallet_address.as_str(),
            record.reason.as_str(),
            &record.user.follower_count.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Read an eligibility CSV, skipping rows that do not decode
pub fn read_eligibility_csv(path: &Path) -> Result<EligibilityFile> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut file = EligibilityFile::default();
    for (i, result) in rdr.deserialize::<EligibilityRow>().enumerate() {
        match result {
            Ok(row) => file.rows.push(row),
            Err(e) => {
                // Header is line 1
                tracing::warn!(line = i + 2, error = %e, "Skipping malformed eligibility row");
                file.malformed += 1;
            }
        }
    }

    Ok(file)
}
