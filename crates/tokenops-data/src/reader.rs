//! Read-only Alloy RPC access to the token contract.
//!
//! Fetches receipts for cost accounting, the contract's historical logs, and
//! its current supply/cap/pause state. Nothing here signs or sends
//! transactions.

use alloy::network::Ethereum;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::fillers::FillProvider;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::eth::BlockNumberOrTag;
use alloy::rpc::types::Filter;
use alloy::sol;
use eyre::{eyre, Context, Result};
use std::sync::Arc;

use crate::types::{OperationCost, RawLogEntry};

/// Default number of blocks the log query looks back from the chain head.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 2_000;

type ProviderType = FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::GasFiller,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::BlobGasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::NonceFiller,
                    alloy::providers::fillers::ChainIdFiller,
                >,
            >,
        >,
    >,
    alloy::providers::RootProvider<Ethereum>,
>;

sol! {
    #[sol(rpc)]
    interface ICappedToken {
        function totalSupply() external view returns (uint256);
        function cap() external view returns (uint256);
        function paused() external view returns (bool);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

/// Point-in-time state of a capped, pausable token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenState {
    /// Circulating supply in base units.
    pub total_supply: U256,
    /// Supply cap in base units.
    pub cap: U256,
    /// Whether transfers are paused.
    pub paused: bool,
    /// Decimal places of the display unit.
    pub decimals: u8,
    /// Ticker symbol.
    pub symbol: String,
}

/// First block of a lookback window ending at `latest`.
///
/// Saturates at genesis when the chain is shorter than `span`.
pub const fn lookback_start(latest: u64, span: u64) -> u64 {
    if latest > span {
        latest - span
    } else {
        0
    }
}

/// Fetches receipts, logs, and token state over HTTP JSON-RPC.
pub struct ChainReader {
    /// Alloy FillProvider; only read methods are used.
    provider: Arc<ProviderType>,
}

impl ChainReader {
    /// Creates a reader and tests RPC connectivity with `eth_blockNumber`.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the endpoint does not answer.
    #[tracing::instrument(skip_all, fields(rpc_url = %rpc_url))]
    pub async fn new(rpc_url: &str) -> Result<Self> {
        let provider =
            ProviderBuilder::new().on_http(rpc_url.parse().wrap_err("invalid RPC URL format")?);
        let provider = Arc::new(provider);

        let block_number = provider
            .get_block_number()
            .await
            .wrap_err("failed to test RPC connectivity with eth_blockNumber")?;

        tracing::info!(
            rpc_url = %rpc_url,
            latest_block = block_number,
            "RPC connection successful"
        );

        Ok(Self { provider })
    }

    /// Current chain head.
    ///
    /// # Errors
    /// Returns error if the RPC call fails.
    pub async fn latest_block(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .wrap_err("failed to fetch latest block number")
    }

    /// Fetches every log emitted by `address` from `from_block` to the head.
    ///
    /// # Errors
    /// Returns error if the `eth_getLogs` call fails.
    #[tracing::instrument(skip(self), fields(%address, from_block))]
    pub async fn fetch_logs(&self, address: Address, from_block: u64) -> Result<Vec<RawLogEntry>> {
        let filter = Filter::new()
            .address(address)
            .from_block(from_block)
            .to_block(BlockNumberOrTag::Latest);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .wrap_err_with(|| format!("eth_getLogs failed for {address:#x} from block {from_block}"))?;

        tracing::debug!(count = logs.len(), "fetched logs");
        Ok(logs.iter().map(RawLogEntry::from).collect())
    }

    /// Reads the receipt of `tx_hash` and returns its cost record.
    ///
    /// # Errors
    /// Returns error if the RPC call fails or the receipt does not exist yet.
    #[tracing::instrument(skip(self), fields(%tx_hash))]
    pub async fn fetch_cost(&self, tx_hash: B256) -> Result<OperationCost> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .wrap_err_with(|| format!("failed to fetch receipt {tx_hash}"))?
            .ok_or_else(|| eyre!("receipt not found for transaction {tx_hash}"))?;

        if !receipt.status() {
            tracing::warn!(%tx_hash, "transaction reverted; its gas still counts");
        }

        let cost = OperationCost::from_receipt(&receipt);
        if cost.effective_price() == 0 {
            tracing::warn!(%tx_hash, "receipt reports no effective gas price; fee counted as zero");
        }
        Ok(cost)
    }

    /// Fetches cost records for `hashes`, one after another, in order.
    ///
    /// # Errors
    /// Returns the first receipt failure.
    pub async fn fetch_costs(&self, hashes: &[B256]) -> Result<Vec<OperationCost>> {
        let mut costs = Vec::with_capacity(hashes.len());
        for hash in hashes {
            costs.push(self.fetch_cost(*hash).await?);
        }
        Ok(costs)
    }

    /// Reads supply, cap, pause flag, decimals, and symbol of `address`.
    ///
    /// # Errors
    /// Returns error if any view call fails (e.g. the contract has no `cap()`).
    #[tracing::instrument(skip(self), fields(%address))]
    pub async fn token_state(&self, address: Address) -> Result<TokenState> {
        let token = ICappedToken::new(address, self.provider.clone());

        let total_supply = token
            .totalSupply()
            .call()
            .await
            .wrap_err("totalSupply() call failed")?
            ._0;
        let cap = token.cap().call().await.wrap_err("cap() call failed")?._0;
        let paused = token
            .paused()
            .call()
            .await
            .wrap_err("paused() call failed")?
            ._0;
        let decimals = token
            .decimals()
            .call()
            .await
            .wrap_err("decimals() call failed")?
            ._0;
        let symbol = token
            .symbol()
            .call()
            .await
            .wrap_err("symbol() call failed")?
            ._0;

        Ok(TokenState {
            total_supply,
            cap,
            paused,
            decimals,
            symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_saturates_at_genesis() {
        assert_eq!(lookback_start(1_500, DEFAULT_LOOKBACK_BLOCKS), 0);
        assert_eq!(lookback_start(2_000, DEFAULT_LOOKBACK_BLOCKS), 0);
    }

    #[test]
    fn lookback_subtracts_span() {
        assert_eq!(lookback_start(5_000, DEFAULT_LOOKBACK_BLOCKS), 3_000);
        assert_eq!(lookback_start(2_001, DEFAULT_LOOKBACK_BLOCKS), 1);
    }

    #[tokio::test]
    async fn new_requires_valid_url() {
        let result = ChainReader::new("invalid://url").await;
        assert!(result.is_err(), "should reject invalid URL");
    }
}
