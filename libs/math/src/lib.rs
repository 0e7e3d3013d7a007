//! # Basin Math Library - StableSwap Invariant Engine
//!
//! ## Purpose
//!
//! Exact integer mathematics for the amplified StableSwap curve: the `D`
//! invariant solver, the single-unknown `y` solvers used for swap pricing and
//! single-coin withdrawals, and the fee helpers shared by the pool's quoting
//! paths. Every operation is unsigned big-integer arithmetic with floor
//! division; there is no floating point anywhere, so identical inputs produce
//! bit-identical outputs on every platform.
//!
//! ## Integration Points
//!
//! - **Input Sources**: normalized balance vectors from the pool's asset
//!   model (`balance * precision * rate / RATE_SCALE`)
//! - **Output Destinations**: swap quotes, share mint/burn estimates and
//!   imbalance-fee adjustments inside the `pool` crate
//! - **Precision**: all intermediates widen to 512 bits so
//!   multiply-before-divide never truncates
//!
//! ## Architecture Role
//!
//! Pure leaf library. Pool identity, token identity and fee accounting live
//! upstream; this crate only sees numbers.

pub mod fees;
pub mod invariant;

pub use fees::{fee_cut, imbalance_fee_rate};
pub use invariant::{amplified_coefficient, compute_d, compute_y, compute_y_for_d};

use thiserror::Error;
use types::U256;

/// Failures of the invariant solvers.
///
/// `Convergence` is fatal for the calling operation: the caller must reject
/// the whole transaction rather than use a partially converged value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    /// Newton iteration did not settle within the cap
    #[error("solver did not converge within {iterations} iterations")]
    Convergence { iterations: usize },

    /// Same index supplied for both sides of a swap solve
    #[error("input and output coin are the same (index {index})")]
    SameCoin { index: usize },

    /// Coin index outside the pool's asset range
    #[error("coin index {index} out of range for {n_coins} coins")]
    IndexOutOfRange { index: usize, n_coins: usize },

    /// A balance that must be strictly positive is zero
    #[error("balance at index {index} is zero")]
    ZeroBalance { index: usize },

    /// Intermediate value exceeded 512 bits or a result exceeded 256 bits
    #[error("arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    /// Pool-level parameter out of the supported range
    #[error("unsupported coin count {n_coins} (2..={max})")]
    UnsupportedCoinCount { n_coins: usize, max: usize },

    /// Amplification coefficient of zero has no invariant solution
    #[error("amplification coefficient is zero")]
    ZeroAmplification,
}

/// Result alias for solver operations.
pub type MathResult<T> = std::result::Result<T, MathError>;

pub use types::U512;

pub(crate) fn to_u256(value: U512, context: &'static str) -> MathResult<U256> {
    let limbs = value.0;
    if limbs[4..].iter().any(|&limb| limb != 0) {
        return Err(MathError::Overflow { context });
    }
    Ok(U256([limbs[0], limbs[1], limbs[2], limbs[3]]))
}
