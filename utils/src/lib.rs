//! Shared utilities for the smartltv workspace.

use alloy::primitives::U256;

/// Seconds in the 360-day year used by the lending protocol's rate model.
pub const SECONDS_PER_YEAR: f64 = 31_104_000.0;

/// Number of fractional digits written for per-second rates.
pub const RATE_DECIMALS: usize = 18;

/// Starknet field prime, 2^251 + 17 * 2^192 + 1. Addresses are felts below it.
pub const STARK_PRIME: U256 = U256::from_limbs([1, 0, 0, 0x0800_0000_0000_0011]);

/// Rounds `value` to `decimals` fractional digits, ties to even.
///
/// Matches numpy's `round`, so `round_decimals(1.0 - 0.9, 2)` is exactly `0.1`.
pub fn round_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Converts a per-annum rate into the per-second rate that compounds to it
/// over [`SECONDS_PER_YEAR`].
pub fn per_annum_to_per_second(per_annum_rate: f64) -> f64 {
    (1.0 + per_annum_rate).powf(1.0 / SECONDS_PER_YEAR) - 1.0
}

/// Formats a value as a fixed-point decimal string, never in scientific notation.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.prec$}", value, prec = decimals)
}

/// Per-annum rate to per-second rate, formatted with [`RATE_DECIMALS`] digits.
pub fn per_second_rate_string(per_annum_rate: f64) -> String {
    format_fixed(per_annum_to_per_second(per_annum_rate), RATE_DECIMALS)
}

/// Parses a `0x`-prefixed hex felt. Returns `None` for malformed input or
/// values outside the Starknet field.
pub fn parse_felt(value: &str) -> Option<U256> {
    let digits = value.strip_prefix("0x")?;
    if digits.is_empty() || digits.len() > 64 {
        return None;
    }
    let felt = U256::from_str_radix(digits, 16).ok()?;
    (felt < STARK_PRIME).then_some(felt)
}

/// Formats a felt as `0x` followed by 64 lowercase hex digits.
pub fn format_felt(value: U256) -> String {
    format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}
