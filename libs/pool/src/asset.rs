//! Per-asset bookkeeping and balance normalization.
//!
//! Every asset carries its own decimal `precision` (`10^(18 - decimals)`) and
//! an 18-decimal fixed-point exchange `rate`. The solvers only ever see the
//! normalized form `balance * precision * rate / RATE_SCALE`, which puts an
//! 8-decimal stable coin and a 13-decimal one on the same 18-decimal axis.

use basin_math::MathError;
use serde::{Deserialize, Serialize};
use types::constants::RATE_SCALE;
use types::{TokenId, U256, U512};

/// One pool-held token slot.
///
/// `admin_fee_balance` is the protocol's accumulated claim, carved out of the
/// reserve at collection time; it is not part of `balance` and does not price
/// swaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub token: TokenId,
    pub balance: U256,
    pub admin_fee_balance: U256,
    /// `10^(18 - decimals)`; fixed at pool init.
    pub precision: U256,
    /// 18-decimal fixed-point price; `RATE_SCALE` means 1.0.
    pub rate: U256,
}

impl Asset {
    pub fn new(token: TokenId, precision: U256, rate: U256) -> Self {
        Self {
            token,
            balance: U256::zero(),
            admin_fee_balance: U256::zero(),
            precision,
            rate,
        }
    }

    /// Normalize an amount of this asset onto the common 18-decimal axis.
    pub fn normalize(&self, amount: U256) -> Result<U256, MathError> {
        let widened = U512::from(amount)
            .checked_mul(U512::from(self.precision))
            .and_then(|v| v.checked_mul(U512::from(self.rate)))
            .ok_or(MathError::Overflow {
                context: "normalize amount",
            })?;
        to_u256(widened / U512::from(RATE_SCALE), "normalize amount")
    }

    /// Convert a normalized amount back into this asset's native units
    /// (floor division; rounding always favors the pool).
    pub fn denormalize(&self, normalized: U256) -> Result<U256, MathError> {
        let scaled = U512::from(normalized)
            .checked_mul(U512::from(RATE_SCALE))
            .ok_or(MathError::Overflow {
                context: "denormalize amount",
            })?;
        let denominator = U512::from(self.precision)
            .checked_mul(U512::from(self.rate))
            .ok_or(MathError::Overflow {
                context: "denormalize amount",
            })?;
        to_u256(scaled / denominator, "denormalize amount")
    }

    /// Normalized reserve as the solvers see it.
    pub fn normalized_balance(&self) -> Result<U256, MathError> {
        self.normalize(self.balance)
    }
}

pub(crate) fn to_u256(value: U512, context: &'static str) -> Result<U256, MathError> {
    let limbs = value.0;
    if limbs[4..].iter().any(|&limb| limb != 0) {
        return Err(MathError::Overflow { context });
    }
    Ok(U256([limbs[0], limbs[1], limbs[2], limbs[3]]))
}
