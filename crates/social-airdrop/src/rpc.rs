//! ERC-20 bindings and RPC provider construction (alloy)

use alloy::{
    network::{EthereumWallet, ReceiptResponse},
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::disburse::{TokenInfo, TokenLedger, TransferReceipt};
use crate::oracle::BalanceQuery;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

fn parse_address(value: &str, what: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .with_context(|| format!("Invalid {} address: {}", what, value))
}

/// Build a read-only provider for one endpoint
pub async fn new_read_provider(rpc_url: &str) -> Result<DynProvider> {
    let provider = ProviderBuilder::new()
        .connect(rpc_url)
        .await
        .with_context(|| format!("Failed to connect to RPC {}", rpc_url))?;
    Ok(provider.erased())
}

/// Build a provider that signs with `private_key` and fills nonce/gas/chain id
pub async fn new_signing_provider(rpc_url: &str, private_key: &str) -> Result<(DynProvider, Address)> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .context("PRIVATE_KEY is not a valid hex-encoded secp256k1 key")?;
    let sender = signer.address();
    let wallet = EthereumWallet::from(signer);

    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect(rpc_url)
        .await
        .with_context(|| format!("Failed to connect to RPC {}", rpc_url))?;

    Ok((provider.erased(), sender))
}

// =============================================================================
// Balance queries (read path)
// =============================================================================

/// `balanceOf` over a fresh HTTP provider per call, so a broken endpoint never
/// poisons the next attempt on a different one.
#[derive(Debug, Default, Clone, Copy)]
pub struct Erc20BalanceQuery;

#[async_trait]
impl BalanceQuery for Erc20BalanceQuery {
    async fn balance_of(&self, rpc_url: &str, owner: &str, token_address: &str) -> Result<U256> {
        let owner = parse_address(owner, "wallet")?;
        let token = parse_address(token_address, "token")?;

        let provider = new_read_provider(rpc_url).await?;
        let contract = IERC20::new(token, &provider);
        let balance = contract.balanceOf(owner).call().await?;
        Ok(balance)
    }
}

// =============================================================================
// Token ledger (write path)
// =============================================================================

/// ERC-20 token as seen from the signing wallet
pub struct Erc20Ledger {
    provider: DynProvider,
    token: Address,
    sender: Address,
}

impl Erc20Ledger {
    pub async fn connect(rpc_url: &str, private_key: &str, token_address: &str) -> Result<Self> {
        let token = parse_address(token_address, "token")?;
        let (provider, sender) = new_signing_provider(rpc_url, private_key).await?;
        Ok(Self {
            provider,
            token,
            sender,
        })
    }
}

#[async_trait]
impl TokenLedger for Erc20Ledger {
    fn sender(&self) -> String {
        self.sender.to_string()
    }

    async fn token_info(&self) -> Result<TokenInfo> {
        let contract = IERC20::new(self.token, &self.provider);
        let decimals = contract.decimals().call().await.context("decimals() call failed")?;
        let symbol = contract.symbol().call().await.context("symbol() call failed")?;
        Ok(TokenInfo { symbol, decimals })
    }

    async fn sender_balance(&self) -> Result<U256> {
        let contract = IERC20::new(self.token, &self.provider);
        let balance = contract
            .balanceOf(self.sender)
            .call()
            .await
            .context("balanceOf(sender) call failed")?;
        Ok(balance)
    }

    async fn transfer(&self, to: &str, amount: U256) -> Result<TransferReceipt> {
        let to = parse_address(to, "recipient")?;
        let contract = IERC20::new(self.token, &self.provider);

        let pending = contract.transfer(to, amount).send().await?;
        let tx_hash = pending.tx_hash().to_string();
        tracing::info!(%tx_hash, "Transaction sent");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            anyhow::bail!("transaction {} reverted", tx_hash);
        }

        Ok(TransferReceipt {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
