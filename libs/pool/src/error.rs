//! Pool and staging error taxonomy.
//!
//! Hard errors abort the call with no mutation. Business-rule violations on
//! paths where the pool already custodies funds are NOT errors - they surface
//! as refund outcomes (see `SwapRejection` / `DepositRejection`) so the funds
//! always travel somewhere.

use basin_math::MathError;
use thiserror::Error;
use types::{Address, TokenId, U256};

/// Hard failures: the call is rejected outright, nothing moves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Caller is not the identity this operation is gated on
    #[error("caller {caller} is not authorized for {operation}")]
    CallerNotAuthorized {
        caller: Address,
        operation: &'static str,
    },

    /// Fee or admin-fee share above its protocol bound
    #[error("fee {value} exceeds maximum {max}")]
    InvalidFee { value: u64, max: u64 },

    /// Amplification target outside `(0, MAX_A]` or ramping too steeply
    #[error("invalid amplification target {target} (current {current})")]
    InvalidAmplification { target: u64, current: u64 },

    /// Ramp completion time is not in the future
    #[error("ramp completion time {completion} is not after now {now}")]
    RampTimeInPast { completion: u64, now: u64 },

    /// Rates vector length does not match the asset count
    #[error("rates length {got} does not match asset count {expected}")]
    InvalidRates { expected: usize, got: usize },

    /// Token identity is not held by this pool
    #[error("token {token} is not in the pool")]
    UnknownToken { token: TokenId },

    /// Pool configured with too few, too many or duplicated assets
    #[error("invalid asset set: {reason}")]
    InvalidAssets { reason: &'static str },

    /// Burn slippage floor not met; shares are not burned
    #[error("withdrawal of asset {index} yields {amount}, below floor {min}")]
    WithdrawalFloorNotMet {
        index: usize,
        amount: U256,
        min: U256,
    },

    /// Burning more shares than exist
    #[error("burning {shares} shares but only {total} outstanding")]
    InsufficientShares { shares: U256, total: U256 },

    /// Swap instruction arrived with no hops left
    #[error("swap route is empty")]
    EmptyRoute,

    /// Withdrawal floor vector length does not match the asset count
    #[error("withdraw floors length {got} does not match asset count {expected}")]
    InvalidWithdrawFloors { expected: usize, got: usize },

    /// Asset index beyond the pool's asset count
    #[error("asset index {index} out of range for {n_coins} assets")]
    AssetIndexOutOfRange { index: usize, n_coins: usize },

    /// Solver failure; the whole call is rejected
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Why a swap produced a refund instead of an output payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapRejection {
    /// `now` is past the instruction's deadline
    DeadlineExpired { deadline: u64, now: u64 },
    /// Incoming token is not a pool asset
    UnknownTokenIn { token: TokenId },
    /// Requested output token is not a pool asset
    UnknownTokenOut { token: TokenId },
    /// Quoted output under the hop's limit
    LimitNotMet { quoted: U256, limit: U256 },
    /// Route's current hop does not reference this pool
    MalformedRoute { expected: Address, got: Address },
}

/// Why a deposit commit refunded every staged asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositRejection {
    /// First liquidity must cover every pool asset with a nonzero amount
    InsufficientSeedAssets,
    /// A staged token is not a pool asset
    UnknownToken { token: TokenId },
    /// Minted shares under the depositor's floor
    SharesBelowMinimum { minted: U256, min: U256 },
    /// Solver could not price the deposit
    Math(MathError),
}

/// Staging-instance failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StagingError {
    /// Caller may not act on this staging instance
    #[error("caller {caller} is not authorized for {operation}")]
    Unauthorized {
        caller: Address,
        operation: &'static str,
    },

    /// Commit requested before any asset arrived
    #[error("no tokens deposited")]
    NoTokensDeposited,
}
