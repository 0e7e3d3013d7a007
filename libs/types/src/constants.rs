//! Protocol-wide numeric constants.
//!
//! All fee ratios are expressed against `FEE_DENOMINATOR`; all exchange rates
//! against `RATE_SCALE`. Values fit in `u64` and are widened to `U256` at the
//! point of use.

/// 1.0 in rate fixed point (18 decimals).
pub const RATE_SCALE: u64 = 1_000_000_000_000_000_000;

/// Denominator for `fee` and `admin_fee_share`.
pub const FEE_DENOMINATOR: u64 = 10_000_000_000;

/// Upper bound on the trading fee: 50%.
pub const MAX_FEE: u64 = FEE_DENOMINATOR / 2;

/// Upper bound on the admin share of the trading fee: 100%.
pub const MAX_ADMIN_FEE: u64 = FEE_DENOMINATOR;

/// Upper bound on the amplification coefficient.
pub const MAX_A: u64 = 1_000_000;

/// Largest multiplicative step a single amplification ramp may take.
pub const MAX_A_CHANGE: u64 = 10;

/// Newton iteration cap for both the `D` and `y` solvers.
pub const MAX_ITERATIONS: usize = 255;

/// Maximum number of assets a pool may hold.
pub const MAX_COINS: usize = 8;

/// Number of decimals every balance is normalized to.
pub const NORMALIZED_DECIMALS: u32 = 18;

/// `10^(18 - decimals)` for an asset with the given decimal count.
///
/// Panics if `decimals` exceeds [`NORMALIZED_DECIMALS`]; pools only accept
/// assets at or below 18 decimals.
pub fn precision_for_decimals(decimals: u32) -> u64 {
    assert!(decimals <= NORMALIZED_DECIMALS, "asset decimals above 18");
    10u64.pow(NORMALIZED_DECIMALS - decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_spans_supported_decimals() {
        assert_eq!(precision_for_decimals(18), 1);
        assert_eq!(precision_for_decimals(9), 1_000_000_000);
        assert_eq!(precision_for_decimals(0), RATE_SCALE);
    }

    #[test]
    #[should_panic(expected = "asset decimals above 18")]
    fn precision_rejects_oversized_decimals() {
        precision_for_decimals(19);
    }
}
