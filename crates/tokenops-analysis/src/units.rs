//! Integer-to-display conversions.
//!
//! Amounts stay in exact integer form until they are rendered here.

use alloy::primitives::U256;

/// Formats a base-unit amount with `decimals` fractional digits.
///
/// Trailing fractional zeros are trimmed, so whole amounts print without a
/// decimal point.
///
/// Examples:
/// - `(10 * 10^18, 18)` -> `"10"`
/// - `(1_500_000_000_000_000_000, 18)` -> `"1.5"`
/// - `(1, 18)` -> `"0.000000000000000001"`
pub fn format_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fractional) = padded.split_at(padded.len() - decimals);
    let fractional = fractional.trim_end_matches('0');

    if fractional.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fractional}")
    }
}

/// Converts to `f64` for presentation. Precision loss is acceptable here.
pub fn to_f64(value: U256) -> f64 {
    // Decimal digits of a U256 always parse as a finite f64.
    value.to_string().parse().unwrap_or(f64::INFINITY)
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: U256, denominator: U256) -> Option<f64> {
    if denominator.is_zero() {
        return None;
    }
    Some(to_f64(numerator) / to_f64(denominator))
}

/// Formats a fraction as a percentage with two decimals (`0.1667` -> `"16.67%"`).
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
