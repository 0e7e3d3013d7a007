//! # Basin Runtime - Deterministic Message Dispatch
//!
//! ## Purpose
//!
//! The execution substrate the chain would otherwise provide: a registry of
//! live instances (pools, staging aggregators, oracles), a FIFO envelope
//! queue that serializes calls per instance, an injected clock, and an
//! outbox collecting every outbound effect (payouts toward vaults, share
//! ledger mints/burns, rejection reports). Cross-instance flows - multi-hop
//! swaps, deposit commits, oracle rate pushes - are chains of independent
//! envelopes; when a later link fails, the failing instance emits a
//! compensating payout instead of unwinding its predecessors.
//!
//! ## Integration Points
//!
//! - **Input Sources**: asset-transfer notifications from the vault boundary
//!   (opaque forward payloads decoded via `codec`), share burn notifications,
//!   explicit deposit commits, oracle price pushes
//! - **Output Destinations**: the effect outbox is the external-collaborator
//!   boundary; a host wires it to real token transfers and a share ledger
//! - **Determinism**: no wall clock, no randomness; `now` is advanced
//!   explicitly, so identical submissions replay identically
//!
//! ## Architecture Role
//!
//! Each envelope is processed to completion before the next starts, which
//! linearizes state transitions exactly like the modeled chain runtime. A
//! multi-threaded embedding must keep one engine per thread or wrap it in
//! its own serialization; instances themselves contain no locks.

pub mod engine;
pub mod message;

pub use engine::{Engine, EngineError};
pub use message::{Effect, Envelope, Message};
