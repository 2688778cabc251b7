//! Search -> dedupe -> eligibility -> CSV
//!
//! Empty intermediate results end the run early without writing a CSV; they
//! are reported as outcomes, not errors.

use anyhow::Result;
use std::path::PathBuf;

use crate::address;
use crate::cache::CacheStore;
use crate::collector::CastCollector;
use crate::config::Config;
use crate::dedupe::dedupe;
use crate::eligibility::{EligibilityEvaluator, write_eligibility_csv};
use crate::neynar::CastSearch;
use crate::oracle::{BalanceOracle, BalanceQuery};

/// Parameters of one eligibility search
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub ticker: String,
    /// Overrides the default `$<ticker>` query
    pub search_text: Option<String>,
    pub token_address: String,
    /// Overrides the default `<ticker>_airdrop_eligible.csv`
    pub output: Option<PathBuf>,
    pub use_cache: bool,
}

impl SearchOptions {
    pub fn search_text(&self) -> String {
        match &self.search_text {
            Some(text) if !text.is_empty() => text.clone(),
            _ => format!("${}", self.ticker),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("{}_airdrop_eligible.csv", self.ticker.to_lowercase())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub casts: usize,
    pub unique_users: usize,
    pub eligible: usize,
    pub csv_rows: usize,
    pub output: PathBuf,
    /// Cast collection stopped before the last page
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    NoCasts,
    NoUsers,
    AllHoldToken,
    Written(PipelineSummary),
}

/// Run every stage for `options`
pub async fn run<S, Q>(options: &SearchOptions, search: S, query: Q, config: &Config) -> Result<PipelineOutcome>
where
    S: CastSearch,
    Q: BalanceQuery,
{
    if !address::is_evm_address(&options.token_address) {
        anyhow::bail!("Invalid token address: {}", options.token_address);
    }

    let search_text = options.search_text();
    let output = options.output_path();
    let store = CacheStore::open(&config.cache_dir);

    println!("\n📋 Configuration:");
    println!("   Ticker: {}", options.ticker);
    println!("   Search text: {}", search_text);
    println!("   Token address: {}", options.token_address);
    println!("   Output file: {}", output.display());
    println!("   Cache enabled: {}", options.use_cache);

    // Stage 1
    println!("\n📡 Stage 1: Fetching casts...");
    let collector = CastCollector::new(search, store.clone(), config.pacing.clone());
    let collection = collector.collect(&search_text, options.use_cache).await;
    if collection.is_partial() {
        tracing::warn!(stop = ?collection.stop, casts = collection.casts.len(), "Cast search ended early; continuing with partial results");
    }
    if collection.casts.is_empty() {
        println!("\n⚠️  No casts found. Try a different search term.");
        return Ok(PipelineOutcome::NoCasts);
    }

    // Stage 2
    println!("\n👥 Stage 2: Extracting unique users...");
    let (users, stats) = dedupe(&collection.casts, &config.spam_filter);
    println!(
        "✓ {} unique users ({} duplicate casts, {} likely bots filtered)",
        users.len(),
        stats.duplicate_casts,
        stats.filtered_bots
    );
    if users.is_empty() {
        println!("\n⚠️  No users found in casts.");
        return Ok(PipelineOutcome::NoUsers);
    }

    // Stage 3
    println!("\n💰 Stage 3: Checking wallet token balances...");
    let oracle = BalanceOracle::new(query, config.rpc_endpoints.clone(), config.pacing.clone());
    let evaluator = EligibilityEvaluator::new(oracle, store, &config.pacing);
    let (records, eval_stats) = evaluator.evaluate(&users, &options.token_address, options.use_cache).await;
    println!(
        "✓ Checked {} users: {} cached, {} on-chain, {} already hold the token",
        eval_stats.users_checked, eval_stats.cache_hits, eval_stats.new_checks, eval_stats.holders
    );
    if records.is_empty() {
        println!("\n⚠️  All users already have the token!");
        return Ok(PipelineOutcome::AllHoldToken);
    }

    // Stage 4
    println!("\n📄 Stage 4: Generating CSV...");
    write_eligibility_csv(&output, &records)?;
    println!("✓ CSV file created: {}", output.display());

    let summary = PipelineSummary {
        casts: collection.casts.len(),
        unique_users: users.len(),
        eligible: eval_stats.eligible,
        csv_rows: records.len(),
        output,
        partial: collection.is_partial(),
    };
    print_summary(&summary, config);

    Ok(PipelineOutcome::Written(summary))
}

fn print_summary(summary: &PipelineSummary, config: &Config) {
    println!("\n=== Complete ===");
    println!("Total casts found:      {}", summary.casts);
    println!("Unique users:           {}", summary.unique_users);
    println!("Eligible for airdrop:   {}", summary.eligible);
    println!("CSV records:            {}", summary.csv_rows);
    if summary.partial {
        println!("⚠️  Cast search stopped early; rerun with --no-cache to retry");
    }
    println!("\n📁 Output: {}", summary.output.display());
    println!("💡 Run again to reuse cached data. Cache location: {}/", config.cache_dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(ticker: &str) -> SearchOptions {
        SearchOptions {
            ticker: ticker.to_string(),
            search_text: None,
            token_address: crate::constants::DEFAULT_TOKEN_ADDRESS.to_string(),
            output: None,
            use_cache: true,
        }
    }

    #[test]
    fn test_defaults_derive_from_ticker() {
        let opts = options("elizaOS");

        assert_eq!(opts.search_text(), "$elizaOS");
        assert_eq!(opts.output_path(), PathBuf::from("elizaos_airdrop_eligible.csv"));
    }

    #[test]
    fn test_explicit_overrides() {
        let mut opts = options("DEGEN");
        opts.search_text = Some("degen szn".to_string());
        opts.output = Some(PathBuf::from("out/degen.csv"));

        assert_eq!(opts.search_text(), "degen szn");
        assert_eq!(opts.output_path(), PathBuf::from("out/degen.csv"));

        opts.search_text = Some(String::new());
        assert_eq!(opts.search_text(), "$DEGEN");
    }
}
