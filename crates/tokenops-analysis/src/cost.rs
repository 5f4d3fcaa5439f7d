//! Batched vs. sequential cost accounting.
//!
//! Compares one batched call (e.g. a single `airdrop` to N recipients)
//! against the N single-target calls that achieve the same effect. All
//! accumulation is exact `U256` arithmetic; floating point appears only in
//! the final savings ratio.

use std::fmt;

use alloy::primitives::U256;
use tokenops_data::OperationCost;

use crate::units::{format_percent, ratio};

/// Signed difference `reference - actual`, kept as sign plus exact magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Savings {
    /// The batch cost less (or the same); holds the amount saved.
    Saved(U256),
    /// The batch cost more; holds the excess.
    Overspent(U256),
}

impl Savings {
    /// Savings of `actual` relative to `reference`.
    pub fn between(reference: U256, actual: U256) -> Self {
        if reference >= actual {
            Self::Saved(reference - actual)
        } else {
            Self::Overspent(actual - reference)
        }
    }

    /// Absolute size of the difference.
    pub const fn magnitude(&self) -> U256 {
        match self {
            Self::Saved(amount) | Self::Overspent(amount) => *amount,
        }
    }

    /// Whether the batch was more expensive.
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::Overspent(amount) if !amount.is_zero())
    }
}

impl fmt::Display for Savings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(amount) => write!(f, "{amount}"),
            Self::Overspent(amount) => write!(f, "-{amount}"),
        }
    }
}

/// Fraction of the sequential total saved by batching.
///
/// A zero sequential total has no meaningful ratio; it is reported as
/// [`SavingsRatio::NotApplicable`], never as `0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SavingsRatio {
    /// `(sequential - batch) / sequential`; negative when the batch cost more.
    Defined(f64),
    /// The sequential total was zero.
    NotApplicable,
}

impl SavingsRatio {
    fn of(savings: Savings, sequential_total: U256) -> Self {
        match ratio(savings.magnitude(), sequential_total) {
            Some(fraction) if savings.is_negative() => Self::Defined(-fraction),
            Some(fraction) => Self::Defined(fraction),
            None => Self::NotApplicable,
        }
    }

    /// The fraction, if defined.
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(fraction) => Some(*fraction),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for SavingsRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(fraction) => f.write_str(&format_percent(*fraction)),
            Self::NotApplicable => f.write_str("n/a"),
        }
    }
}

/// Result of comparing one batched call against a sequence of single calls.
#[derive(Clone, Debug, PartialEq)]
pub struct CostComparison {
    /// Gas used by the batched call.
    pub batch_gas: U256,
    /// Fee paid by the batched call.
    pub batch_fee: U256,
    /// Number of sequential calls compared.
    pub sequential_count: usize,
    /// Total gas across the sequential calls.
    pub sequential_gas_total: U256,
    /// Total fee across the sequential calls.
    pub sequential_fee_total: U256,
    /// `sequential_gas_total - batch_gas`.
    pub gas_saved: Savings,
    /// `sequential_fee_total - batch_fee`.
    pub fee_saved: Savings,
    /// `gas_saved / sequential_gas_total`.
    pub gas_saved_ratio: SavingsRatio,
    /// `fee_saved / sequential_fee_total`.
    pub fee_saved_ratio: SavingsRatio,
}

/// Compares a batched call against the sequential calls it replaces.
///
/// `sequential` may be empty, in which case both totals are zero and both
/// ratios are [`SavingsRatio::NotApplicable`].
pub fn compare(batch: &OperationCost, sequential: &[OperationCost]) -> CostComparison {
    let batch_gas = U256::from(batch.gas_used());
    let batch_fee = batch.fee();
    let sequential_gas_total = sum_gas(sequential);
    let sequential_fee_total = sum_fees(sequential);

    let gas_saved = Savings::between(sequential_gas_total, batch_gas);
    let fee_saved = Savings::between(sequential_fee_total, batch_fee);

    CostComparison {
        batch_gas,
        batch_fee,
        sequential_count: sequential.len(),
        sequential_gas_total,
        sequential_fee_total,
        gas_saved,
        fee_saved,
        gas_saved_ratio: SavingsRatio::of(gas_saved, sequential_gas_total),
        fee_saved_ratio: SavingsRatio::of(fee_saved, sequential_fee_total),
    }
}

/// Aggregate cost over an arbitrary list of calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostTotals {
    /// Number of calls aggregated.
    pub count: usize,
    /// Sum of gas used.
    pub gas_total: U256,
    /// Sum of fees.
    pub fee_total: U256,
    /// Arithmetic mean of the effective prices, truncated; zero when empty.
    pub mean_price: U256,
}

/// Aggregates gas, fees, and mean price over `ops`.
pub fn totals(ops: &[OperationCost]) -> CostTotals {
    let count = ops.len();
    let price_sum = ops
        .iter()
        .map(|op| U256::from(op.effective_price()))
        .fold(U256::ZERO, |acc, price| acc + price);
    let mean_price = if count == 0 {
        U256::ZERO
    } else {
        price_sum / U256::from(count)
    };

    CostTotals {
        count,
        gas_total: sum_gas(ops),
        fee_total: sum_fees(ops),
        mean_price,
    }
}

fn sum_gas(ops: &[OperationCost]) -> U256 {
    ops.iter()
        .map(|op| U256::from(op.gas_used()))
        .fold(U256::ZERO, |acc, gas| acc + gas)
}

// Each fee is below 2^192, so fewer than 2^64 of them sum exactly.
fn sum_fees(ops: &[OperationCost]) -> U256 {
    ops.iter()
        .map(OperationCost::fee)
        .fold(U256::ZERO, |acc, fee| acc + fee)
}
