//! Pricing paths: swap output, share mint, balanced and single-coin
//! withdrawal estimates.
//!
//! Everything here is read-only over the asset list; the pool applies the
//! resulting deltas atomically after its own policy checks. All quoting runs
//! in normalized units and denormalizes at the edges with floor division, so
//! rounding always lands in the pool's favor. The swap path additionally
//! withholds one normalized unit, which keeps a reserve from ever being
//! drained below a single unit regardless of input size.

use crate::asset::Asset;
use basin_math::{
    amplified_coefficient, compute_d, compute_y, compute_y_for_d, fee_cut, imbalance_fee_rate,
    MathError, MathResult,
};
use types::{U256, U512};

/// Result of pricing one swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapQuote {
    /// Net output in the output asset's native units.
    pub amount_out: U256,
    /// Protocol's cut of the trading fee, output-asset native units.
    pub admin_fee: U256,
}

/// Result of pricing a liquidity deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositQuote {
    /// Shares to mint.
    pub shares: U256,
    /// Protocol's cut of the imbalance fee per asset, native units.
    pub admin_fees: Vec<U256>,
}

/// Result of pricing a single-coin withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOneQuote {
    /// Net payout in the asset's native units.
    pub amount_out: U256,
    /// Protocol's cut of the imbalance fee, native units.
    pub admin_fee: U256,
}

pub(crate) fn normalized_balances(assets: &[Asset]) -> MathResult<Vec<U256>> {
    assets.iter().map(Asset::normalized_balance).collect()
}

pub(crate) fn amplification(a: u64, n_coins: usize) -> MathResult<U256> {
    amplified_coefficient(U256::from(a), n_coins)
}

/// `a * b / c` with a widened intermediate.
pub(crate) fn mul_div(a: U256, b: U256, c: U256) -> MathResult<U256> {
    if c.is_zero() {
        return Err(MathError::Overflow {
            context: "division by zero",
        });
    }
    let product = U512::from(a)
        .checked_mul(U512::from(b))
        .ok_or(MathError::Overflow { context: "mul_div" })?;
    crate::asset::to_u256(product / U512::from(c), "mul_div")
}

/// Price `amount_in` of asset `i` against asset `j`.
pub(crate) fn swap_quote(
    assets: &[Asset],
    a: u64,
    fee: u64,
    admin_fee_share: u64,
    i: usize,
    j: usize,
    amount_in: U256,
) -> MathResult<SwapQuote> {
    let xp = normalized_balances(assets)?;
    let ann = amplification(a, assets.len())?;

    let dx = assets[i].normalize(amount_in)?;
    let y = compute_y(&xp, ann, i, j, xp[i] + dx)?;

    // One normalized unit withheld: conservative rounding, and the floor
    // that keeps the output reserve from reaching zero.
    let gross = xp[j].saturating_sub(y).saturating_sub(U256::one());
    let fee_amount = fee_cut(gross, U256::from(fee))?;
    let admin_amount = fee_cut(fee_amount, U256::from(admin_fee_share))?;

    Ok(SwapQuote {
        amount_out: assets[j].denormalize(gross - fee_amount)?,
        admin_fee: assets[j].denormalize(admin_amount)?,
    })
}

/// Price a deposit of `amounts` (asset-index order, zeros allowed once the
/// pool is seeded).
///
/// On the very first deposit every asset must be present: a zero amount
/// surfaces as [`MathError::ZeroBalance`], which the pool maps to its
/// seed-asset rejection.
pub(crate) fn deposit_quote(
    assets: &[Asset],
    a: u64,
    fee: u64,
    admin_fee_share: u64,
    total_shares: U256,
    amounts: &[U256],
) -> MathResult<DepositQuote> {
    let n = assets.len();
    let ann = amplification(a, n)?;
    let old_xp = normalized_balances(assets)?;

    let mut new_xp = Vec::with_capacity(n);
    for (asset, amount) in assets.iter().zip(amounts) {
        new_xp.push(asset.normalized_balance()? + asset.normalize(*amount)?);
    }
    let d1 = compute_d(&new_xp, ann)?;

    if total_shares.is_zero() {
        // Seed deposit: shares are the invariant itself, no imbalance fee.
        return Ok(DepositQuote {
            shares: d1,
            admin_fees: vec![U256::zero(); n],
        });
    }

    let d0 = compute_d(&old_xp, ann)?;

    // Charge the deviation from a perfectly proportional increase, at the
    // swap-equivalent imbalance rate.
    let fee_rate = imbalance_fee_rate(U256::from(fee), n)?;
    let admin_share = U256::from(admin_fee_share);
    let mut adjusted = Vec::with_capacity(n);
    let mut admin_fees = Vec::with_capacity(n);
    for i in 0..n {
        let ideal = mul_div(d1, old_xp[i], d0)?;
        let diff = if ideal > new_xp[i] {
            ideal - new_xp[i]
        } else {
            new_xp[i] - ideal
        };
        let fee_i = fee_cut(diff, fee_rate)?;
        let admin_i = fee_cut(fee_i, admin_share)?;
        let adjusted_i = new_xp[i].checked_sub(fee_i).ok_or(MathError::Overflow {
            context: "imbalance fee exceeds balance",
        })?;
        adjusted.push(adjusted_i);
        admin_fees.push(assets[i].denormalize(admin_i)?);
    }

    let d2 = compute_d(&adjusted, ann)?;
    let shares = if d2 > d0 {
        mul_div(total_shares, d2 - d0, d0)?
    } else {
        U256::zero()
    };

    Ok(DepositQuote { shares, admin_fees })
}

/// Proportional withdrawal amounts for `shares`, native units per asset.
pub(crate) fn balanced_withdrawal(
    assets: &[Asset],
    total_shares: U256,
    shares: U256,
) -> MathResult<Vec<U256>> {
    assets
        .iter()
        .map(|asset| mul_div(asset.balance, shares, total_shares))
        .collect()
}

/// Price the withdrawal of `shares` entirely into asset `index`.
pub(crate) fn withdraw_one_quote(
    assets: &[Asset],
    a: u64,
    fee: u64,
    admin_fee_share: u64,
    total_shares: U256,
    shares: U256,
    index: usize,
) -> MathResult<WithdrawOneQuote> {
    let n = assets.len();
    let ann = amplification(a, n)?;
    let xp = normalized_balances(assets)?;

    let d0 = compute_d(&xp, ann)?;
    let d1 = d0 - mul_div(d0, shares, total_shares)?;
    let new_y = compute_y_for_d(&xp, ann, index, d1)?;

    // Ideal (fee-free) withdrawal, then the imbalance-fee-adjusted solve.
    let dy_ideal = xp[index].saturating_sub(new_y);

    let fee_rate = imbalance_fee_rate(U256::from(fee), n)?;
    let mut reduced = Vec::with_capacity(n);
    for (j, xp_j) in xp.iter().enumerate() {
        let proportional = mul_div(*xp_j, d1, d0)?;
        let dx_expected = if j == index {
            proportional.saturating_sub(new_y)
        } else {
            *xp_j - proportional
        };
        reduced.push(*xp_j - fee_cut(dx_expected, fee_rate)?);
    }

    let y_reduced = compute_y_for_d(&reduced, ann, index, d1)?;
    let dy = reduced[index]
        .saturating_sub(y_reduced)
        .saturating_sub(U256::one());

    let fee_total = dy_ideal.saturating_sub(U256::one()).saturating_sub(dy);
    let admin_amount = fee_cut(fee_total, U256::from(admin_fee_share))?;

    Ok(WithdrawOneQuote {
        amount_out: assets[index].denormalize(dy)?,
        admin_fee: assets[index].denormalize(admin_amount)?,
    })
}

/// Share estimate for depositing or withdrawing `amounts`, the
/// `calc_token_amount` getter. The deposit direction prices exactly what a
/// real deposit would mint (imbalance fee included) so callers can use it as
/// a minimum-shares floor; the withdrawal direction is the fee-free
/// D-difference.
pub(crate) fn token_amount_estimate(
    assets: &[Asset],
    a: u64,
    fee: u64,
    admin_fee_share: u64,
    total_shares: U256,
    amounts: &[U256],
    is_deposit: bool,
) -> MathResult<U256> {
    if is_deposit {
        return Ok(deposit_quote(assets, a, fee, admin_fee_share, total_shares, amounts)?.shares);
    }

    let n = assets.len();
    let ann = amplification(a, n)?;
    let old_xp = normalized_balances(assets)?;
    let d0 = compute_d(&old_xp, ann)?;

    let mut new_xp = Vec::with_capacity(n);
    for (i, asset) in assets.iter().enumerate() {
        let delta = asset.normalize(amounts[i])?;
        let remaining = old_xp[i].checked_sub(delta).ok_or(MathError::Overflow {
            context: "withdrawal exceeds reserve",
        })?;
        new_xp.push(remaining);
    }
    let d1 = compute_d(&new_xp, ann)?;

    mul_div(total_shares, d0 - d1, d0)
}
