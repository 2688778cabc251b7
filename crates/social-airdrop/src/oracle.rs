//! Token-holding checks against a rotating pool of RPC endpoints
//!
//! Public RPCs rate-limit and drop requests regularly, so a check walks the
//! pool round-robin with exponential backoff. The rotation cursor belongs to
//! the oracle instance and is shared by every call: after a failure the next
//! check starts on the endpoint that follows the one that failed.
//!
//! A check that exhausts its attempts yields [`Holding::Unknown`]. The
//! pipeline resolves that with [`UnknownPolicy::AssumeNoToken`], i.e. an
//! unreachable chain makes a user look eligible rather than stopping the run.

use alloy::primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::sleep;

use crate::address;
use crate::config::Pacing;

/// A single `balanceOf(owner)` call against one endpoint
#[async_trait]
pub trait BalanceQuery: Send + Sync {
    async fn balance_of(&self, rpc_url: &str, owner: &str, token_address: &str) -> Result<U256>;
}

#[async_trait]
impl<T: BalanceQuery> BalanceQuery for &T {
    async fn balance_of(&self, rpc_url: &str, owner: &str, token_address: &str) -> Result<U256> {
        (**self).balance_of(rpc_url, owner, token_address).await
    }
}

/// Outcome of a holding check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holding {
    /// An endpoint answered; `true` when the balance is non-zero
    Definite(bool),
    /// Every attempt failed
    Unknown,
}

/// How an [`Holding::Unknown`] is turned into a yes/no answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Treat the wallet as not holding the token (favours finishing the run)
    #[default]
    AssumeNoToken,
    /// Treat the wallet as holding the token (favours never paying a holder)
    AssumeHolds,
}

impl Holding {
    pub fn resolve(self, policy: UnknownPolicy) -> bool {
        match (self, policy) {
            (Holding::Definite(holds), _) => holds,
            (Holding::Unknown, UnknownPolicy::AssumeNoToken) => false,
            (Holding::Unknown, UnknownPolicy::AssumeHolds) => true,
        }
    }
}

/// Balance oracle over an ordered endpoint pool
pub struct BalanceOracle<Q> {
    query: Q,
    endpoints: Vec<String>,
    cursor: AtomicUsize,
    pacing: Pacing,
    policy: UnknownPolicy,
}

impl<Q: BalanceQuery> BalanceOracle<Q> {
    pub fn new(query: Q, endpoints: Vec<String>, pacing: Pacing) -> Self {
        Self {
            query,
            endpoints,
            cursor: AtomicUsize::new(0),
            pacing,
            policy: UnknownPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnknownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnknownPolicy {
        self.policy
    }

    /// Index of the endpoint the next attempt will use (before the modulo)
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Each endpoint gets two tries per check
    pub fn max_attempts(&self) -> usize {
        self.endpoints.len() * 2
    }

    /// Does `owner` hold a non-zero balance of `token_address`? Never fails;
    /// an undecidable check is resolved by the oracle's [`UnknownPolicy`].
    pub async fn holds_token(&self, owner: &str, token_address: &str) -> bool {
        self.check(owner, token_address).await.resolve(self.policy)
    }

    /// Typed holding check
    pub async fn check(&self, owner: &str, token_address: &str) -> Holding {
        if self.endpoints.is_empty() {
            tracing::warn!("No RPC endpoints configured; balance unknown");
            return Holding::Unknown;
        }
        if !address::is_evm_address(owner) {
            tracing::warn!(owner, "Not an EVM address; balance unknown");
            return Holding::Unknown;
        }

        let max_attempts = self.max_attempts();

        for attempt in 0..max_attempts {
            let index = self.cursor.load(Ordering::Relaxed) % self.endpoints.len();
            let rpc_url = &self.endpoints[index];

            match self.query.balance_of(rpc_url, owner, token_address).await {
                Ok(balance) => return Holding::Definite(balance > U256::ZERO),
                Err(e) => {
                    // Move the shared cursor so the retry (and later checks) use the next endpoint
                    self.cursor.fetch_add(1, Ordering::Relaxed);

                    if attempt + 1 == max_attempts {
                        tracing::warn!(
                            wallet = address::short(owner),
                            attempts = max_attempts,
                            error = %e,
                            "Balance check failed on all RPCs"
                        );
                        return Holding::Unknown;
                    }

                    tracing::debug!(rpc_url = rpc_url.as_str(), attempt, error = %e, "Balance query failed, rotating RPC");
                    sleep(self.pacing.backoff(attempt as u32)).await;
                }
            }
        }

        Holding::Unknown
    }
}
