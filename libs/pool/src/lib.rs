//! # Basin Pool - StableSwap Reserve State Machine
//!
//! ## Purpose
//!
//! The pool owns reserves for a fixed set of heterogeneous-decimal assets and
//! drives every balance mutation: swap execution (local payout or peer-hop
//! forwarding), liquidity share minting through the atomic deposit protocol,
//! balanced and single-coin withdrawals, amplification ramping, exchange-rate
//! updates and admin-fee accounting. All pricing delegates to `basin-math`;
//! the pool adds normalization, fee extraction and the refund-over-revert
//! failure policy that keeps user funds from stranding.
//!
//! ## Integration Points
//!
//! - **Input Sources**: decoded swap/deposit instructions (`codec`), burn
//!   notifications, admin messages, rate pushes from the configured rates
//!   manager
//! - **Output Destinations**: payout instructions toward the vault boundary,
//!   share mint/burn amounts toward the share ledger, peer-hop forwards
//!   toward the next pool
//! - **Authorization**: the pool re-derives the staging address for
//!   `(depositor, pool)` and checks admin/rates-manager identity itself; it
//!   never trusts a caller-supplied identity
//!
//! ## Architecture Role
//!
//! One `Pool` value is one on-chain pool instance. The runtime serializes
//! calls per instance; every method is a complete atomic transition that
//! either commits fully or leaves state untouched and reports why.

pub mod asset;
pub mod error;
pub mod pool;
pub mod quote;
pub mod ramp;
pub mod staging;

pub use asset::Asset;
pub use error::{DepositRejection, PoolError, StagingError, SwapRejection};
pub use pool::{
    BurnOutcome, DepositOutcome, Payout, Pool, PoolConfig, PoolSnapshot, SwapOutcome,
};
pub use quote::{DepositQuote, SwapQuote, WithdrawOneQuote};
pub use ramp::AmplificationRamp;
pub use staging::{DepositStaging, StagingOutcome};
