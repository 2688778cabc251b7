//! Stage 4: turn eligibility results into a `holders,amounts` distribution
//!
//! The distribution file is what the sender consumes. Only real EVM addresses
//! make it in; users without a verified wallet are reported but never paid.

use alloy::primitives::U256;
use alloy::primitives::utils::{format_units, parse_units};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, Writer};
use std::collections::HashMap;
use std::path::Path;

use crate::address;
use crate::constants;
use crate::dedupe::SpamFilter;
use crate::eligibility::read_eligibility_csv;
use crate::error::{PreconditionError, validate_amount};

/// Precision used when summing human-readable amounts
const SUM_DECIMALS: u8 = 18;

/// One payout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionEntry {
    pub address: String,
    /// Human-readable decimal amount, scaled by token decimals at send time
    pub amount: String,
}

// =============================================================================
// Builder
// =============================================================================

/// Pair every valid wallet with `amount`; sentinels and malformed addresses are dropped
pub fn build<'a, I>(wallets: I, amount: &str) -> Vec<DistributionEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let entries = wallets.into_iter().filter_map(|wallet| {
        let wallet = wallet.trim();
        if address::is_sentinel(wallet) || !address::is_evm_address(wallet) {
            return None;
        }
        Some(DistributionEntry {
            address: wallet.to_string(),
            amount: amount.to_string(),
        })
    });

    collapse(entries)
}

/// Remove duplicate addresses (case-insensitive). Each address keeps the
/// position of its first occurrence and the amount of its last.
pub fn collapse<I>(entries: I) -> Vec<DistributionEntry>
where
    I: IntoIterator<Item = DistributionEntry>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<DistributionEntry> = Vec::new();

    for entry in entries {
        let key = address::normalize(&entry.address);
        match index.get(&key) {
            Some(&i) => out[i].amount = entry.amount,
            None => {
                index.insert(key, out.len());
                out.push(entry);
            }
        }
    }

    out
}

/// `amount × count`, exact for up to 18 decimal places
pub fn total_amount(amount: &str, count: usize) -> Option<String> {
    let per_entry = parse_units(amount, SUM_DECIMALS).ok()?.get_absolute();
    let total = per_entry.checked_mul(U256::from(count))?;
    let formatted = format_units(total, SUM_DECIMALS).ok()?;
    Some(trim_decimal(&formatted))
}

pub(crate) fn trim_decimal(value: &str) -> String {
    if value.contains('.') {
        value.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        value.to_string()
    }
}

// =============================================================================
// Distribution CSV
// =============================================================================

pub fn write_distribution_csv(path: &Path, entries: &[DistributionEntry]) -> Result<()> {
    let mut wtr = Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record(["holders", "amounts"])?;
    for entry in entries {
        wtr.write_record([entry.address.as_str(), entry.amount.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Entries read from a distribution CSV
#[derive(Debug, Default)]
pub struct DistributionFile {
    pub entries: Vec<DistributionEntry>,
    /// Rows without a `0x` address or an amount
    pub skipped: usize,
}

/// Read a `holders,amounts` file. Column names are not checked, only positions.
pub fn read_distribution_csv(path: &Path) -> Result<DistributionFile> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut file = DistributionFile::default();
    for (i, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = i + 2, error = %e, "Skipping unreadable distribution row");
                file.skipped += 1;
                continue;
            }
        };

        let holder = record.get(0).unwrap_or_default();
        let amount = record.get(1).unwrap_or_default();
        if !holder.starts_with("0x") || amount.is_empty() {
            tracing::warn!(line = i + 2, row = ?record, "Skipping distribution row");
            file.skipped += 1;
            continue;
        }

        file.entries.push(DistributionEntry {
            address: holder.to_string(),
            amount: amount.to_string(),
        });
    }

    Ok(file)
}

// =============================================================================
// Export
// =============================================================================

/// Counts reported by an export
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub rows_read: usize,
    pub malformed: usize,
    pub holders_skipped: usize,
    pub bots: usize,
    pub no_address: usize,
    pub invalid_address: usize,
    pub duplicates: usize,
    pub entries: Vec<DistributionEntry>,
    pub total_amount: Option<String>,
}

/// Convert an eligibility CSV into a distribution CSV
pub fn export(input: &Path, output: &Path, amount: &str, filter: &SpamFilter) -> Result<ExportSummary> {
    validate_amount(amount)?;
    if !input.exists() {
        return Err(PreconditionError::MissingFile(input.to_path_buf()).into());
    }

    println!("\n📄 Reading {}...", input.display());
    let file = read_eligibility_csv(input)?;
    if file.rows.is_empty() {
        return Err(PreconditionError::EmptyFile(input.to_path_buf()).into());
    }

    let mut summary = ExportSummary {
        rows_read: file.rows.len(),
        malformed: file.malformed,
        ..ExportSummary::default()
    };

    let mut wallets: Vec<&str> = Vec::new();
    for row in &file.rows {
        if !row.reason.is_eligible() {
            summary.holders_skipped += 1;
        } else if filter.is_spam(row.fid, row.follower_count) {
            summary.bots += 1;
        } else if address::is_sentinel(&row.wallet_address) {
            summary.no_address += 1;
        } else if !address::is_evm_address(&row.wallet_address) {
            tracing::warn!(username = %row.username, wallet = %row.wallet_address, "Invalid wallet address");
            summary.invalid_address += 1;
        } else {
            wallets.push(row.wallet_address.as_str());
        }
    }

    let candidates = wallets.len();
    summary.entries = build(wallets, amount);
    summary.duplicates = candidates - summary.entries.len();

    if summary.entries.is_empty() {
        return Err(PreconditionError::NoValidHolders.into());
    }

    write_distribution_csv(output, &summary.entries)?;
    summary.total_amount = total_amount(amount, summary.entries.len());

    print_export_summary(output, amount, &summary);
    Ok(summary)
}

fn print_export_summary(output: &Path, amount: &str, summary: &ExportSummary) {
    println!("\n=== Airdrop Export ===");
    println!("Rows read:            {}", summary.rows_read);
    if summary.malformed > 0 {
        println!("Malformed rows:       {}", summary.malformed);
    }
    println!("Already holders:      {}", summary.holders_skipped);
    println!("Filtered bots:        {}", summary.bots);
    println!("No verified address:  {}", summary.no_address);
    if summary.invalid_address > 0 {
        println!("Invalid addresses:    {}", summary.invalid_address);
    }
    if summary.duplicates > 0 {
        println!("Duplicate addresses:  {}", summary.duplicates);
    }
    println!("Recipients:           {}", summary.entries.len());
    println!("Amount each:          {}", amount);
    match &summary.total_amount {
        Some(total) => println!("Total:                {}", total),
        None => println!("Total:                {} × {}", amount, summary.entries.len()),
    }

    println!("\nSample:");
    println!("  holders,amounts");
    for entry in summary.entries.iter().take(constants::PREVIEW_ROWS) {
        println!("  {},{}", entry.address, entry.amount);
    }
    if summary.entries.len() > constants::PREVIEW_ROWS {
        println!("  ... and {} more", summary.entries.len() - constants::PREVIEW_ROWS);
    }

    println!("\n✓ Wrote {}", output.display());
}
