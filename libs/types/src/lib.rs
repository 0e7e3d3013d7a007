//! # Basin Type System - Identities, Amounts and Protocol Constants
//!
//! ## Purpose
//!
//! Shared vocabulary for every Basin crate: opaque chain identities
//! (`Address`, `Hash`, `PublicKey`, `Signature`), the token identity model
//! (`TokenId`), 256-bit unsigned amounts, and the protocol-wide numeric
//! constants (fee basis, rate fixed point, amplification bounds).
//!
//! ## Integration Points
//!
//! - **Input Sources**: message decoding (`codec`), pool configuration
//! - **Output Destinations**: solver arithmetic (`basin-math`), pool and
//!   oracle state machines, runtime dispatch
//! - **Determinism**: staging-instance addresses are derived with Keccak-256
//!   over `(owner, pool)` so repeated deposits converge on one aggregator
//!
//! ## Architecture Role
//!
//! Leaf crate with no Basin dependencies. Everything above it speaks in these
//! types, so cross-crate boundaries never exchange raw byte buffers.

pub mod constants;
pub mod identity;

pub use constants::*;
pub use identity::{
    derive_staging_address, Address, Hash, IdentityError, PublicKey, Signature, TokenId,
};

/// 256-bit unsigned integer used for balances, shares and rates.
pub use ethereum_types::U256;
/// 512-bit unsigned integer used for solver intermediates.
pub use ethereum_types::U512;
