//! Type definitions for completed operations and raw chain logs.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::{Log, TransactionReceipt};
use thiserror::Error;

/// Errors raised while building an [`OperationCost`] from untrusted figures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostError {
    /// A cost figure was negative.
    #[error("invalid input: {field} must be non-negative, got {value}")]
    InvalidInput {
        /// Which figure was rejected (`gas_used` or `effective_price`).
        field: &'static str,
        /// The offending value.
        value: i128,
    },
    /// A textual cost figure could not be parsed at all.
    #[error("cannot parse {field} from '{input}': {reason}")]
    Malformed {
        /// Which figure was being parsed.
        field: &'static str,
        /// The raw text.
        input: String,
        /// Parser message.
        reason: String,
    },
}

/// Cost record of one completed on-chain call.
///
/// Gas is a `u64`, as in receipts, and the price a `u128`, so every fee is
/// below 2^192 and sums of fees cannot overflow a [`U256`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OperationCost {
    gas_used: u64,
    effective_price: u128,
}

impl OperationCost {
    /// Builds a cost record. A missing price is recorded as zero.
    pub const fn new(gas_used: u64, effective_price: Option<u128>) -> Self {
        let effective_price = match effective_price {
            Some(price) => price,
            None => 0,
        };
        Self {
            gas_used,
            effective_price,
        }
    }

    /// Builds a cost record from signed figures, rejecting negatives.
    ///
    /// # Errors
    /// Returns [`CostError::InvalidInput`] if either figure is below zero.
    pub fn try_from_signed(gas_used: i64, effective_price: Option<i128>) -> Result<Self, CostError> {
        let gas_used = u64::try_from(gas_used).map_err(|_| CostError::InvalidInput {
            field: "gas_used",
            value: i128::from(gas_used),
        })?;
        let effective_price = effective_price
            .map(|price| non_negative("effective_price", price))
            .transpose()?;
        Ok(Self::new(gas_used, effective_price))
    }

    /// Builds a cost record from a settled transaction receipt.
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self::new(receipt.gas_used, Some(receipt.effective_gas_price))
    }

    /// Gas consumed by the call.
    pub const fn gas_used(&self) -> u64 {
        self.gas_used
    }

    /// Price paid per gas unit, in the smallest fee denomination.
    pub const fn effective_price(&self) -> u128 {
        self.effective_price
    }

    /// `gas_used * effective_price`, computed without loss.
    pub fn fee(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_price)
    }
}

/// Parses `GAS[@PRICE]`, e.g. `150000@20` or `0x5208`.
impl FromStr for OperationCost {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (gas, price) = match s.split_once('@') {
            Some((gas, price)) => (gas, Some(price)),
            None => (s, None),
        };

        let gas_used = gas_to_u64(gas.to_string(), parse_figure("gas_used", gas)?)?;
        let effective_price = price
            .map(|price| parse_figure("effective_price", price))
            .transpose()?;
        Ok(Self::new(gas_used, effective_price))
    }
}

fn non_negative(field: &'static str, value: i128) -> Result<u128, CostError> {
    u128::try_from(value).map_err(|_| CostError::InvalidInput { field, value })
}

fn gas_to_u64(input: String, gas_used: u128) -> Result<u64, CostError> {
    u64::try_from(gas_used).map_err(|err| CostError::Malformed {
        field: "gas_used",
        input,
        reason: err.to_string(),
    })
}

fn parse_figure(field: &'static str, text: &str) -> Result<u128, CostError> {
    let trimmed = text.trim();
    let malformed = |reason: String| CostError::Malformed {
        field,
        input: text.to_string(),
        reason,
    };

    if let Some(hex) = trimmed.strip_prefix("0x") {
        return u128::from_str_radix(hex, 16).map_err(|err| malformed(err.to_string()));
    }

    match trimmed.parse::<i128>() {
        Ok(value) => non_negative(field, value),
        // Values above i128::MAX are still valid unsigned figures.
        Err(_) => trimmed
            .parse::<u128>()
            .map_err(|err| malformed(err.to_string())),
    }
}

/// A log entry as returned by the chain, before any ABI is applied.
///
/// Provenance is optional: pending logs and hand-built entries carry none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawLogEntry {
    /// Emitting contract, if known.
    pub address: Option<Address>,
    /// Indexed topics; `topics[0]` is the event selector for non-anonymous events.
    pub topics: Vec<B256>,
    /// Non-indexed payload.
    pub data: Bytes,
    /// Block containing the log.
    pub block_number: Option<u64>,
    /// Transaction that emitted the log.
    pub transaction_hash: Option<B256>,
    /// Position of the log within its block.
    pub log_index: Option<u64>,
}

impl RawLogEntry {
    /// Builds an entry with no provenance.
    pub fn new(topics: Vec<B256>, data: impl Into<Bytes>) -> Self {
        Self {
            topics,
            data: data.into(),
            ..Self::default()
        }
    }

    /// Attaches block and transaction provenance.
    pub fn with_provenance(mut self, block_number: u64, transaction_hash: B256) -> Self {
        self.block_number = Some(block_number);
        self.transaction_hash = Some(transaction_hash);
        self
    }

    /// The event selector topic, if any.
    pub fn signature(&self) -> Option<&B256> {
        self.topics.first()
    }
}

impl From<&Log> for RawLogEntry {
    fn from(log: &Log) -> Self {
        Self {
            address: Some(log.address()),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_price_is_zero() {
        let cost = OperationCost::new(21_000, None);
        assert_eq!(cost.effective_price(), 0);
        assert_eq!(cost.fee(), U256::ZERO);
    }

    #[test]
    fn fee_is_exact_beyond_u128() {
        let cost = OperationCost::new(1_u64 << 60, Some(1_u128 << 120));
        assert_eq!(cost.fee(), U256::from(1_u8) << 180_usize);
    }

    #[test]
    fn rejects_negative_gas() {
        let err = OperationCost::try_from_signed(-1, Some(20)).unwrap_err();
        assert_eq!(
            err,
            CostError::InvalidInput {
                field: "gas_used",
                value: -1
            }
        );
    }

    #[test]
    fn rejects_negative_price() {
        let err = OperationCost::try_from_signed(60_000, Some(-20)).unwrap_err();
        assert!(matches!(
            err,
            CostError::InvalidInput {
                field: "effective_price",
                ..
            }
        ));
    }

    #[test]
    fn parses_gas_and_price() {
        let cost: OperationCost = "150000@20".parse().unwrap();
        assert_eq!(cost.gas_used(), 150_000);
        assert_eq!(cost.effective_price(), 20);
        assert_eq!(cost.fee(), U256::from(3_000_000_u64));
    }

    #[test]
    fn parses_hex_and_bare_gas() {
        let cost: OperationCost = "0x5208".parse().unwrap();
        assert_eq!(cost.gas_used(), 21_000);
        assert_eq!(cost.effective_price(), 0);
    }

    #[test]
    fn parse_rejects_negative_figures() {
        let err = "-5@1".parse::<OperationCost>().unwrap_err();
        assert!(matches!(err, CostError::InvalidInput { field: "gas_used", .. }));
    }

    #[test]
    fn parse_rejects_gas_beyond_u64() {
        let err = "18446744073709551616@1".parse::<OperationCost>().unwrap_err();
        assert!(matches!(err, CostError::Malformed { field: "gas_used", .. }));

        let max: OperationCost = "18446744073709551615".parse().unwrap();
        assert_eq!(max.gas_used(), u64::MAX);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "lots@20".parse::<OperationCost>().unwrap_err();
        assert!(matches!(err, CostError::Malformed { field: "gas_used", .. }));
    }

    #[test]
    fn signature_is_first_topic() {
        let selector = B256::repeat_byte(0xaa);
        let entry = RawLogEntry::new(vec![selector, B256::ZERO], Bytes::new());
        assert_eq!(entry.signature(), Some(&selector));
        assert_eq!(RawLogEntry::default().signature(), None);
    }
}
