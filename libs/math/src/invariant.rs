//! Newton's-method solvers for the amplified StableSwap curve.
//!
//! The invariant for `n` coins with amplification `A` is
//!
//! ```text
//! A * n^n * sum(x_i) + D = A * D * n^n + D^(n+1) / (n^n * prod(x_i))
//! ```
//!
//! `compute_d` finds `D` for a balance vector; `compute_y` finds the one
//! unknown balance that keeps `D` constant after changing another balance
//! (swap pricing); `compute_y_for_d` finds the one unknown balance for an
//! externally fixed `D` (single-coin withdrawal). All three iterate until
//! successive iterates differ by at most 1 and fail with
//! [`MathError::Convergence`] after [`MAX_ITERATIONS`] rounds.

use crate::{to_u256, MathError, MathResult};
use types::constants::{MAX_COINS, MAX_ITERATIONS};
use types::{U256, U512};

fn checked_mul(a: U512, b: U512, context: &'static str) -> MathResult<U512> {
    a.checked_mul(b).ok_or(MathError::Overflow { context })
}

fn abs_diff(a: U512, b: U512) -> U512 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

fn validate_coin_count(n_coins: usize) -> MathResult<()> {
    if !(2..=MAX_COINS).contains(&n_coins) {
        return Err(MathError::UnsupportedCoinCount {
            n_coins,
            max: MAX_COINS,
        });
    }
    Ok(())
}

/// `ann = A * n^n`, the amplification coefficient as the solvers consume it.
pub fn amplified_coefficient(a: U256, n_coins: usize) -> MathResult<U256> {
    validate_coin_count(n_coins)?;
    let n = U512::from(n_coins);
    let mut ann = U512::from(a);
    for _ in 0..n_coins {
        ann = checked_mul(ann, n, "amplified coefficient")?;
    }
    to_u256(ann, "amplified coefficient")
}

/// Solve the invariant `D` for a normalized balance vector.
///
/// An all-zero vector has `D = 0` (the empty-pool fixed point). A vector with
/// some, but not all, zero entries has no finite solution and fails with
/// [`MathError::ZeroBalance`].
pub fn compute_d(xp: &[U256], ann: U256) -> MathResult<U256> {
    validate_coin_count(xp.len())?;
    if ann.is_zero() {
        return Err(MathError::ZeroAmplification);
    }
    let n = U512::from(xp.len());
    let one = U512::one();
    let ann = U512::from(ann);

    let mut s = U512::zero();
    for x in xp {
        s = s + U512::from(*x);
    }
    if s.is_zero() {
        return Ok(U256::zero());
    }

    let mut d = s;
    for _ in 0..MAX_ITERATIONS {
        // d_p = d^(n+1) / (n^n * prod(x_i)), folded one factor at a time
        let mut d_p = d;
        for (index, x) in xp.iter().enumerate() {
            if x.is_zero() {
                return Err(MathError::ZeroBalance { index });
            }
            let denom = checked_mul(U512::from(*x), n, "d_p denominator")?;
            d_p = checked_mul(d_p, d, "d_p numerator")? / denom;
        }

        let d_prev = d;
        // d = (ann*s + n*d_p) * d / ((ann - 1)*d + (n + 1)*d_p)
        let numerator = checked_mul(
            checked_mul(ann, s, "d numerator")? + checked_mul(d_p, n, "d numerator")?,
            d,
            "d numerator",
        )?;
        let denominator = checked_mul(ann - one, d, "d denominator")?
            + checked_mul(n + one, d_p, "d denominator")?;
        d = numerator / denominator;

        if abs_diff(d, d_prev) <= one {
            return to_u256(d, "invariant D");
        }
    }

    Err(MathError::Convergence {
        iterations: MAX_ITERATIONS,
    })
}

/// Solve the post-swap balance of coin `j` given coin `i` moving to `new_x`,
/// holding `D` (computed from the pre-swap vector) constant.
pub fn compute_y(
    xp: &[U256],
    ann: U256,
    i: usize,
    j: usize,
    new_x: U256,
) -> MathResult<U256> {
    let n_coins = xp.len();
    validate_coin_count(n_coins)?;
    if i == j {
        return Err(MathError::SameCoin { index: i });
    }
    for index in [i, j] {
        if index >= n_coins {
            return Err(MathError::IndexOutOfRange { index, n_coins });
        }
    }

    let d = U512::from(compute_d(xp, ann)?);
    solve_y(xp, ann, d, j, |k| if k == i { Some(new_x) } else { None })
}

/// Solve the balance of coin `i` for an externally reduced invariant `d`
/// (single-coin withdrawal: `d` already reflects the burned share ratio).
pub fn compute_y_for_d(xp: &[U256], ann: U256, i: usize, d: U256) -> MathResult<U256> {
    let n_coins = xp.len();
    validate_coin_count(n_coins)?;
    if i >= n_coins {
        return Err(MathError::IndexOutOfRange { index: i, n_coins });
    }

    solve_y(xp, ann, U512::from(d), i, |_| None)
}

/// Shared quadratic iteration:
///
/// ```text
/// y^2 + y * (s + d/ann - d) = d^(n+1) / (n^n * prod' * ann * n)
/// y = (y^2 + c) / (2y + b - d)
/// ```
///
/// `skip` is the index being solved for; `override_at` substitutes a balance
/// (the swap's incoming side) and returns `None` to use the stored one.
fn solve_y(
    xp: &[U256],
    ann: U256,
    d: U512,
    skip: usize,
    override_at: impl Fn(usize) -> Option<U256>,
) -> MathResult<U256> {
    if ann.is_zero() {
        return Err(MathError::ZeroAmplification);
    }
    let n = U512::from(xp.len());
    let one = U512::one();
    let two = U512::from(2u8);
    let ann = U512::from(ann);

    let mut c = d;
    let mut s = U512::zero();
    for (k, stored) in xp.iter().enumerate() {
        if k == skip {
            continue;
        }
        let x_k = U512::from(override_at(k).unwrap_or(*stored));
        if x_k.is_zero() {
            return Err(MathError::ZeroBalance { index: k });
        }
        s = s + x_k;
        c = checked_mul(c, d, "y coefficient c")? / checked_mul(x_k, n, "y coefficient c")?;
    }
    c = checked_mul(c, d, "y coefficient c")? / checked_mul(ann, n, "y coefficient c")?;
    let b = s + d / ann;

    let mut y = d;
    for _ in 0..MAX_ITERATIONS {
        let y_prev = y;
        let numerator = checked_mul(y, y, "y numerator")? + c;
        let denominator = checked_mul(two, y, "y denominator")? + b - d;
        y = numerator / denominator;

        if abs_diff(y, y_prev) <= one {
            return to_u256(y, "balance y");
        }
    }

    Err(MathError::Convergence {
        iterations: MAX_ITERATIONS,
    })
}
