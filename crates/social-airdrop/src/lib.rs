//! Social airdrop tooling for ERC-20 tokens on Base
//!
//! Finds Farcaster accounts that mention a token, keeps the ones whose
//! verified wallets do not hold it yet, and pays them from a signing wallet.
//!
//! Stages:
//! 1. [`collector`] pages through cast search results
//! 2. [`dedupe`] reduces casts to unique authors
//! 3. [`eligibility`] checks wallets on chain through the [`oracle`]
//! 4. [`distribution`] turns the eligibility CSV into a payout list
//! 5. [`disburse`] sends the payouts, resumably

pub mod address;
pub mod cache;
pub mod collector;
pub mod config;
pub mod constants;
pub mod dedupe;
pub mod disburse;
pub mod distribution;
pub mod eligibility;
pub mod error;
pub mod neynar;
pub mod oracle;
pub mod pipeline;
pub mod rpc;
