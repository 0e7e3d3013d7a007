//! Fee arithmetic shared by the pool's quoting paths.
//!
//! Fees are ratios over [`FEE_DENOMINATOR`]; all cuts are floor divisions of
//! a widened product so the fee never rounds against the pool.

use crate::{to_u256, MathError, MathResult};
use types::constants::FEE_DENOMINATOR;
use types::{U256, U512};

/// `amount * fee / FEE_DENOMINATOR`, floored.
pub fn fee_cut(amount: U256, fee: U256) -> MathResult<U256> {
    let product = U512::from(amount)
        .checked_mul(U512::from(fee))
        .ok_or(MathError::Overflow { context: "fee cut" })?;
    to_u256(product / U512::from(FEE_DENOMINATOR), "fee cut")
}

/// Imbalance-fee rate for an `n`-coin deposit or single-coin withdrawal:
/// `base_fee * n / (4 * (n - 1))`.
///
/// The scaling makes the fee on a maximally lopsided liquidity move equal the
/// swap fee that the equivalent swap would have paid.
pub fn imbalance_fee_rate(base_fee: U256, n_coins: usize) -> MathResult<U256> {
    if n_coins < 2 {
        return Err(MathError::UnsupportedCoinCount {
            n_coins,
            max: types::constants::MAX_COINS,
        });
    }
    let numerator = U512::from(base_fee)
        .checked_mul(U512::from(n_coins))
        .ok_or(MathError::Overflow {
            context: "imbalance fee",
        })?;
    let denominator = U512::from(4u8) * U512::from(n_coins - 1);
    to_u256(numerator / denominator, "imbalance fee")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_cut_floors() {
        // 0.3% of 100_000 = 300
        let fee = U256::from(FEE_DENOMINATOR / 1000 * 3);
        assert_eq!(
            fee_cut(U256::from(100_000u64), fee).unwrap(),
            U256::from(300u64)
        );
        // floor: 0.3% of 999 = 2.997 -> 2
        assert_eq!(fee_cut(U256::from(999u64), fee).unwrap(), U256::from(2u64));
    }

    #[test]
    fn imbalance_rate_matches_closed_form() {
        let base = U256::from(4_000_000u64);
        // n = 2: base * 2 / 4 = base / 2
        assert_eq!(
            imbalance_fee_rate(base, 2).unwrap(),
            U256::from(2_000_000u64)
        );
        // n = 4: base * 4 / 12 = base / 3
        assert_eq!(
            imbalance_fee_rate(base, 4).unwrap(),
            U256::from(1_333_333u64)
        );
    }

    #[test]
    fn imbalance_rate_needs_two_coins() {
        assert!(imbalance_fee_rate(U256::from(1u8), 1).is_err());
    }
}
