//! Send the airdrop: one ERC-20 transfer per distribution row
//!
//! Runs are resumable. Paid addresses are recorded in the progress document
//! for the token, and a later run only sends to addresses not yet recorded.
//! Transfers are strictly sequential; each waits for its receipt before the
//! next one is submitted.
//!
//! Flow: validate balance -> load progress -> dry run (preview only) or
//! confirm -> transfer -> final report.

use alloy::primitives::U256;
use alloy::primitives::utils::{format_units, parse_units};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;

use crate::address;
use crate::cache::{CacheStore, progress_cache_name};
use crate::config::Pacing;
use crate::constants;
use crate::distribution::{DistributionEntry, collapse, read_distribution_csv, trim_decimal};
use crate::error::PreconditionError;

// =============================================================================
// Ledger and confirmation seams
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// The token contract as seen from the sending wallet
#[async_trait]
pub trait TokenLedger: Send + Sync {
    fn sender(&self) -> String;
    async fn token_info(&self) -> Result<TokenInfo>;
    async fn sender_balance(&self) -> Result<U256>;
    /// Submit a transfer and wait for its receipt; a revert is an error
    async fn transfer(&self, to: &str, amount: U256) -> Result<TransferReceipt>;
}

#[async_trait]
impl<T: TokenLedger> TokenLedger for &T {
    fn sender(&self) -> String {
        (**self).sender()
    }

    async fn token_info(&self) -> Result<TokenInfo> {
        (**self).token_info().await
    }

    async fn sender_balance(&self) -> Result<U256> {
        (**self).sender_balance().await
    }

    async fn transfer(&self, to: &str, amount: U256) -> Result<TransferReceipt> {
        (**self).transfer(to, amount).await
    }
}

/// Operator sign-off before live transfers
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> Result<bool>;
}

#[async_trait]
impl<T: Confirmation> Confirmation for &T {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        (**self).confirm(prompt).await
    }
}

/// Reads one line from stdin
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("Failed to read confirmation")?;
        Ok(is_affirmative(&line))
    }
}

/// `yes` or `y`, any case
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "yes" | "y")
}

// =============================================================================
// Progress and outcome
// =============================================================================

/// Progress document for one token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Addresses already paid, in payment order
    #[serde(default)]
    pub sent: Vec<String>,
    #[serde(default)]
    pub timestamp: String,
    /// True once a run finished with no failures
    #[serde(default)]
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub address: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisbursementReport {
    pub succeeded: usize,
    pub failures: Vec<TransferFailure>,
    /// `amount × succeeded`, formatted with token decimals
    pub total_sent: String,
    pub symbol: String,
    /// False when the final progress save failed
    pub progress_saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisbursementOutcome {
    /// Every address in the file was paid by an earlier run
    AlreadyComplete { sent: usize },
    /// Nothing was sent; `pending` would have been paid
    DryRun { pending: Vec<DistributionEntry> },
    /// The operator declined
    Cancelled { pending: usize },
    InsufficientBalance { needed: String, have: String, short: String },
    Completed(DisbursementReport),
}

// =============================================================================
// Engine
// =============================================================================

/// Read and check a distribution file before anything touches the network
pub fn load_distribution(path: &Path) -> Result<Vec<DistributionEntry>> {
    if !path.exists() {
        return Err(PreconditionError::MissingFile(path.to_path_buf()).into());
    }

    let file = read_distribution_csv(path)?;
    if file.skipped > 0 {
        tracing::warn!(skipped = file.skipped, "Skipped rows without an address or amount");
    }
    if file.entries.is_empty() {
        return Err(PreconditionError::EmptyFile(path.to_path_buf()).into());
    }

    println!("✓ Loaded {} addresses from {}", file.entries.len(), path.display());
    Ok(file.entries)
}

pub struct Disburser<L, C> {
    ledger: L,
    confirmation: C,
    store: CacheStore,
    transfer_delay: Duration,
}

impl<L: TokenLedger, C: Confirmation> Disburser<L, C> {
    pub fn new(ledger: L, confirmation: C, store: CacheStore, pacing: &Pacing) -> Self {
        Self {
            ledger,
            confirmation,
            store,
            transfer_delay: pacing.transfer_delay,
        }
    }

    pub async fn run(
        &self,
        entries: &[DistributionEntry],
        token_address: &str,
        dry_run: bool,
    ) -> Result<DisbursementOutcome> {
        let original_len = entries.len();
        let entries = collapse(entries.iter().cloned());
        let Some(first) = entries.first() else {
            return Err(PreconditionError::NoValidHolders.into());
        };

        let repeated = original_len - entries.len();
        if repeated > 0 {
            tracing::warn!(repeated, "Dropped repeated addresses from the distribution");
        }

        // Validate
        println!("💼 Sender wallet: {}", self.ledger.sender());
        let info = self.ledger.token_info().await.context("Failed to read token metadata")?;
        let balance = self
            .ledger
            .sender_balance()
            .await
            .context("Failed to read sender balance")?;

        if entries.iter().any(|e| e.amount != first.amount) {
            tracing::warn!(amount = %first.amount, "Distribution amounts differ; every transfer uses the first row's amount");
        }
        let amount_each = parse_units(&first.amount, info.decimals)
            .with_context(|| format!("Invalid amount {:?} for {} decimals", first.amount, info.decimals))?
            .get_absolute();
        let needed = amount_each
            .checked_mul(U256::from(entries.len()))
            .context("Total amount overflows uint256")?;

        let fmt = |value: U256| display_units(value, info.decimals);
        println!("\n🪙  Token: {} ({} decimals)", info.symbol, info.decimals);
        println!("   Recipients:   {}", entries.len());
        println!("   Amount each:  {} {}", first.amount, info.symbol);
        println!("   Total needed: {} {}", fmt(needed), info.symbol);
        println!("   Your balance: {} {}", fmt(balance), info.symbol);

        if balance < needed {
            let outcome = DisbursementOutcome::InsufficientBalance {
                needed: fmt(needed),
                have: fmt(balance),
                short: fmt(needed - balance),
            };
            eprintln!("\n❌ Insufficient balance! Short by {} {}", fmt(needed - balance), info.symbol);
            return Ok(outcome);
        }
        println!("   ✓ Sufficient balance");

        // Resume
        let progress_name = progress_cache_name(token_address);
        let mut progress: ProgressRecord = self.store.load(&progress_name).unwrap_or_default();
        if !progress.sent.is_empty() {
            println!("\n📦 Loaded progress: {} already sent", progress.sent.len());
        }
        let already_sent: HashSet<String> = progress.sent.iter().map(|a| address::normalize(a)).collect();
        let pending: Vec<DistributionEntry> = entries
            .iter()
            .filter(|e| !already_sent.contains(&address::normalize(&e.address)))
            .cloned()
            .collect();

        if pending.is_empty() {
            println!("✓ All addresses have already been sent to");
            return Ok(DisbursementOutcome::AlreadyComplete {
                sent: progress.sent.len(),
            });
        }
        println!("\n📤 Will send to {} addresses", pending.len());

        if dry_run {
            print_preview(&pending, &info.symbol);
            return Ok(DisbursementOutcome::DryRun { pending });
        }

        println!("\n⚠️  LIVE MODE: real tokens will be sent");
        println!("   Send {} {} to {} addresses", first.amount, info.symbol, pending.len());
        println!(
            "   This run sends: {} {} ({} pending)",
            fmt(amount_each * U256::from(pending.len())),
            info.symbol,
            pending.len()
        );
        if pending.len() < entries.len() {
            println!(
                "   Whole file:     {} {} ({} recipients, used for the balance check)",
                fmt(needed),
                info.symbol,
                entries.len()
            );
        }
        let confirmed = self
            .confirmation
            .confirm("Type 'yes' to confirm and send tokens: ")
            .await?;
        if !confirmed {
            println!("\n❌ Cancelled. No tokens sent.");
            return Ok(DisbursementOutcome::Cancelled { pending: pending.len() });
        }

        // Transfer
        println!("\n🚀 Starting airdrop...");
        let mut succeeded = 0usize;
        let mut failures: Vec<TransferFailure> = Vec::new();

        for (i, entry) in pending.iter().enumerate() {
            println!("[{}/{}] Sending to {}...", i + 1, pending.len(), entry.address);

            match self.ledger.transfer(&entry.address, amount_each).await {
                Ok(receipt) => {
                    match receipt.block_number {
                        Some(block) => println!("  ✓ {} confirmed in block {}", receipt.tx_hash, block),
                        None => println!("  ✓ {} confirmed", receipt.tx_hash),
                    }
                    succeeded += 1;
                    progress.sent.push(entry.address.clone());

                    if succeeded % constants::PROGRESS_CHECKPOINT_TRANSFERS == 0 {
                        progress.timestamp = Utc::now().to_rfc3339();
                        progress.complete = false;
                        self.store.checkpoint(&progress_name, &progress);
                        println!("  💾 Progress saved ({} sent)", succeeded);
                    }
                }
                Err(e) => {
                    let error = format!("{:#}", e);
                    eprintln!("  ✗ Failed: {}", error);
                    tracing::warn!(address = %entry.address, error = %error, "Transfer failed");
                    failures.push(TransferFailure {
                        address: entry.address.clone(),
                        error,
                    });
                }
            }

            if i + 1 < pending.len() {
                sleep(self.transfer_delay).await;
            }
        }

        progress.timestamp = Utc::now().to_rfc3339();
        progress.complete = failures.is_empty();
        let progress_saved = match self.store.save(&progress_name, &progress) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    path = %self.store.path(&progress_name).display(),
                    error = %format!("{:#}", e),
                    "Failed to save airdrop progress; a rerun may pay these addresses again"
                );
                false
            }
        };

        let report = DisbursementReport {
            succeeded,
            total_sent: fmt(amount_each * U256::from(succeeded)),
            symbol: info.symbol.clone(),
            failures,
            progress_saved,
        };
        print_report(&report);

        Ok(DisbursementOutcome::Completed(report))
    }
}

/// Token units to a human-readable decimal string
fn display_units(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(formatted) => trim_decimal(&formatted),
        Err(_) => value.to_string(),
    }
}

fn print_preview(pending: &[DistributionEntry], symbol: &str) {
    println!("\n🔍 DRY RUN - no tokens will be sent");
    println!("First {} transfers that would be sent:", constants::PREVIEW_ROWS.min(pending.len()));
    for (i, entry) in pending.iter().take(constants::PREVIEW_ROWS).enumerate() {
        println!("  {}. {} → {} {}", i + 1, entry.address, entry.amount, symbol);
    }
    if pending.len() > constants::PREVIEW_ROWS {
        println!("  ... and {} more", pending.len() - constants::PREVIEW_ROWS);
    }
    println!("\n✓ Dry run complete. Use --no-dry-run to send for real.");
}

fn print_report(report: &DisbursementReport) {
    println!("\n=== Airdrop Complete ===");
    println!("✓ Successful: {}", report.succeeded);
    println!("✗ Failed:     {}", report.failures.len());
    println!("Total sent:   {} {}", report.total_sent, report.symbol);

    if !report.failures.is_empty() {
        println!("\n❌ Failed addresses:");
        for failure in &report.failures {
            println!("   {}: {}", failure.address, failure.error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOKEN: &str = "0xea17df5cf6d172224892b5477a16acb111182478";

    struct MockLedger {
        decimals: u8,
        balance: U256,
        failing: HashSet<String>,
        transfers: Mutex<Vec<(String, U256)>>,
        /// When set, records the saved progress size seen at each transfer
        observe: Option<CacheStore>,
        observed: Mutex<Vec<Option<(usize, bool)>>>,
    }

    impl MockLedger {
        fn new(decimals: u8, balance: u64) -> Self {
            Self {
                decimals,
                balance: U256::from(balance),
                failing: HashSet::new(),
                transfers: Mutex::new(Vec::new()),
                observe: None,
                observed: Mutex::new(Vec::new()),
            }
        }

        fn sent_to(&self) -> Vec<String> {
            self.transfers.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
        }
    }

    #[async_trait]
    impl TokenLedger for MockLedger {
        fn sender(&self) -> String {
            "0x9999999999999999999999999999999999999999".to_string()
        }

        async fn token_info(&self) -> Result<TokenInfo> {
            Ok(TokenInfo {
                symbol: "elizaOS".to_string(),
                decimals: self.decimals,
            })
        }

        async fn sender_balance(&self) -> Result<U256> {
            Ok(self.balance)
        }

        async fn transfer(&self, to: &str, amount: U256) -> Result<TransferReceipt> {
            if let Some(store) = &self.observe {
                let saved = store.load::<ProgressRecord>(&progress_cache_name(TOKEN));
                self.observed
                    .lock()
                    .unwrap()
                    .push(saved.map(|p| (p.sent.len(), p.complete)));
            }
            self.transfers.lock().unwrap().push((to.to_string(), amount));
            if self.failing.contains(to) {
                anyhow::bail!("execution reverted");
            }
            Ok(TransferReceipt {
                tx_hash: format!("0xtx{}", to),
                block_number: Some(1),
            })
        }
    }

    struct Answer {
        yes: bool,
        asked: AtomicUsize,
    }

    impl Answer {
        fn new(yes: bool) -> Self {
            Self {
                yes,
                asked: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Confirmation for Answer {
        async fn confirm(&self, _prompt: &str) -> Result<bool> {
            self.asked.fetch_add(1, Ordering::Relaxed);
            Ok(self.yes)
        }
    }

    fn wallet(n: u64) -> String {
        format!("0x{:040x}", n)
    }

    fn entries(wallets: &[String], amount: &str) -> Vec<DistributionEntry> {
        wallets
            .iter()
            .map(|w| DistributionEntry {
                address: w.clone(),
                amount: amount.to_string(),
            })
            .collect()
    }

    fn disburser<'a>(
        ledger: &'a MockLedger,
        answer: &'a Answer,
        store: &CacheStore,
    ) -> Disburser<&'a MockLedger, &'a Answer> {
        Disburser::new(ledger, answer, store.clone(), &Pacing::none())
    }

    fn save_progress(store: &CacheStore, sent: &[String]) {
        let progress = ProgressRecord {
            sent: sent.to_vec(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            complete: false,
        };
        store.save(&progress_cache_name(TOKEN), &progress).unwrap();
    }

    #[tokio::test]
    async fn test_insufficient_balance_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let ledger = MockLedger::new(0, 150);
        let answer = Answer::new(true);
        let list = entries(&[wallet(0xabc), wallet(0xdef)], "100");

        let outcome = disburser(&ledger, &answer, &store).run(&list, TOKEN, false).await.unwrap();

        assert_eq!(
            outcome,
            DisbursementOutcome::InsufficientBalance {
                needed: "200".to_string(),
                have: "150".to_string(),
                short: "50".to_string(),
            }
        );
        assert!(ledger.sent_to().is_empty());
        assert_eq!(answer.asked.load(Ordering::Relaxed), 0);
        assert!(store.load::<ProgressRecord>(&progress_cache_name(TOKEN)).is_none());
    }

    #[tokio::test]
    async fn test_resume_only_pays_new_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        save_progress(&store, &[wallet(1), wallet(2)]);
        let ledger = MockLedger::new(0, 1_000);
        let answer = Answer::new(true);
        let list = entries(&[wallet(1), wallet(2), wallet(3)], "10");

        let outcome = disburser(&ledger, &answer, &store).run(&list, TOKEN, false).await.unwrap();

        assert_eq!(ledger.sent_to(), vec![wallet(3)]);
        let DisbursementOutcome::Completed(report) = outcome else {
            panic!("expected completed run");
        };
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.total_sent, "10");
        assert!(report.progress_saved);

        let progress: ProgressRecord = store.load(&progress_cache_name(TOKEN)).unwrap();
        assert_eq!(progress.sent, vec![wallet(1), wallet(2), wallet(3)]);
        assert!(progress.complete);
    }

    #[tokio::test]
    async fn test_resume_matches_addresses_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let mixed = "0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD".to_string();
        save_progress(&store, &[mixed.to_ascii_lowercase()]);
        let ledger = MockLedger::new(0, 1_000);
        let answer = Answer::new(true);

        let outcome = disburser(&ledger, &answer, &store)
            .run(&entries(&[mixed], "1"), TOKEN, false)
            .await
            .unwrap();

        assert_eq!(outcome, DisbursementOutcome::AlreadyComplete { sent: 1 });
        assert!(ledger.sent_to().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_rows_pay_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let lower = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd".to_string();
        let upper = "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD".to_string();
        // Enough for one payout each, not for four
        let ledger = MockLedger::new(0, 20);
        let answer = Answer::new(true);
        let list = entries(&[lower.clone(), upper, lower.clone(), wallet(1)], "10");

        let outcome = disburser(&ledger, &answer, &store).run(&list, TOKEN, false).await.unwrap();

        let DisbursementOutcome::Completed(report) = outcome else {
            panic!("expected completed run");
        };
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.total_sent, "20");
        assert_eq!(ledger.sent_to(), vec![lower, wallet(1)]);
    }

    #[tokio::test]
    async fn test_token_address_case_shares_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let checksummed = "0xEA17Df5Cf6D172224892B5477A16ACb111182478";
        let answer = Answer::new(true);
        let list = entries(&[wallet(1), wallet(2)], "1");

        let first = MockLedger::new(0, 100);
        disburser(&first, &answer, &store).run(&list, checksummed, false).await.unwrap();
        assert_eq!(first.sent_to().len(), 2);

        let second = MockLedger::new(0, 100);
        let outcome = disburser(&second, &answer, &store).run(&list, TOKEN, false).await.unwrap();

        assert_eq!(outcome, DisbursementOutcome::AlreadyComplete { sent: 2 });
        assert!(second.sent_to().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_progress_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        save_progress(&store, &[wallet(1)]);
        let before = std::fs::read_to_string(store.path(&progress_cache_name(TOKEN))).unwrap();
        let ledger = MockLedger::new(18, u64::MAX);
        let answer = Answer::new(true);
        let wallets: Vec<String> = (1..=8).map(wallet).collect();

        let outcome = disburser(&ledger, &answer, &store)
            .run(&entries(&wallets, "1"), TOKEN, true)
            .await
            .unwrap();

        let DisbursementOutcome::DryRun { pending } = outcome else {
            panic!("expected dry run");
        };
        assert_eq!(pending.len(), 7);
        assert_eq!(pending[0].address, wallet(2));
        assert!(ledger.sent_to().is_empty());
        assert_eq!(answer.asked.load(Ordering::Relaxed), 0);
        let after = std::fs::read_to_string(store.path(&progress_cache_name(TOKEN))).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_declined_confirmation_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let ledger = MockLedger::new(0, 100);
        let answer = Answer::new(false);

        let outcome = disburser(&ledger, &answer, &store)
            .run(&entries(&[wallet(1)], "1"), TOKEN, false)
            .await
            .unwrap();

        assert_eq!(outcome, DisbursementOutcome::Cancelled { pending: 1 });
        assert_eq!(answer.asked.load(Ordering::Relaxed), 1);
        assert!(ledger.sent_to().is_empty());
        assert!(!store.path(&progress_cache_name(TOKEN)).exists());
    }

    #[tokio::test]
    async fn test_failures_are_recorded_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let mut ledger = MockLedger::new(0, 1_000);
        ledger.failing.insert(wallet(2));
        let answer = Answer::new(true);
        let list = entries(&[wallet(1), wallet(2), wallet(3)], "5");

        let outcome = disburser(&ledger, &answer, &store).run(&list, TOKEN, false).await.unwrap();

        let DisbursementOutcome::Completed(report) = outcome else {
            panic!("expected completed run");
        };
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.total_sent, "10");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].address, wallet(2));
        assert!(report.failures[0].error.contains("reverted"));
        assert_eq!(ledger.sent_to(), vec![wallet(1), wallet(2), wallet(3)]);

        let progress: ProgressRecord = store.load(&progress_cache_name(TOKEN)).unwrap();
        assert_eq!(progress.sent, vec![wallet(1), wallet(3)]);
        assert!(!progress.complete);

        // The retry only touches the failed address
        let retry_ledger = MockLedger::new(0, 1_000);
        disburser(&retry_ledger, &answer, &store).run(&list, TOKEN, false).await.unwrap();
        assert_eq!(retry_ledger.sent_to(), vec![wallet(2)]);
        let progress: ProgressRecord = store.load(&progress_cache_name(TOKEN)).unwrap();
        assert!(progress.complete);
    }

    #[tokio::test]
    async fn test_progress_checkpoint_every_ten_successes() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let mut ledger = MockLedger::new(0, 1_000);
        ledger.observe = Some(store.clone());
        let answer = Answer::new(true);
        let wallets: Vec<String> = (1..=12).map(wallet).collect();

        disburser(&ledger, &answer, &store)
            .run(&entries(&wallets, "1"), TOKEN, false)
            .await
            .unwrap();

        let observed = ledger.observed.lock().unwrap().clone();
        assert!(observed[..10].iter().all(Option::is_none));
        assert_eq!(observed[10], Some((10, false)));
        assert_eq!(observed[11], Some((10, false)));
    }

    #[tokio::test]
    async fn test_amount_scaled_by_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path());
        let ledger = MockLedger::new(18, u64::MAX);
        let answer = Answer::new(true);

        disburser(&ledger, &answer, &store)
            .run(&entries(&[wallet(1)], "1.5"), TOKEN, false)
            .await
            .unwrap();

        let transfers = ledger.transfers.lock().unwrap().clone();
        assert_eq!(transfers[0].1, U256::from(1_500_000_000_000_000_000u64));
    }

    #[test]
    fn test_load_distribution_preconditions() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_distribution(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::MissingFile(_))
        ));

        let empty_path = dir.path().join("empty.csv");
        std::fs::write(&empty_path, "holders,amounts\n").unwrap();
        let empty = load_distribution(&empty_path).unwrap_err();
        assert!(matches!(
            empty.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::EmptyFile(_))
        ));

        let ok_path = dir.path().join("ok.csv");
        std::fs::write(&ok_path, format!("holders,amounts\n{},420\n", wallet(1))).unwrap();
        assert_eq!(load_distribution(&ok_path).unwrap().len(), 1);
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(is_affirmative("yes\n"));
        assert!(is_affirmative("Y"));
        assert!(is_affirmative("  YES  "));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("yeah"));
    }
}
