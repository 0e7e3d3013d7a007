//! # Basin Codec - Message Bodies and Payload Parsing
//!
//! ## Purpose
//!
//! Encoding and decoding rules for every opaque payload the core exchanges
//! with its collaborators: the forward payload attached to a token transfer
//! (a swap or a deposit instruction, tagged by a leading op code), the
//! withdrawal mode attached to a share burn, and the price attestation body
//! the oracle hashes and signs. The format is a plain big-endian byte layout
//! with length-prefixed variable sections - no host-specific cell or bit
//! packing survives here.
//!
//! ## Integration Points
//!
//! - **Input Sources**: token-transfer notifications (vault boundary), share
//!   burn notifications, oracle attestation submissions
//! - **Output Destinations**: typed instructions consumed by `pool` and
//!   `runtime`; attestation bytes hashed by `oracle`
//! - **Validation**: every parse is bounds-checked; trailing bytes and
//!   unknown op codes are errors, never silently ignored
//!
//! ## Architecture Role
//!
//! The codec is the only place where raw bytes become typed instructions. A
//! payload that fails to parse makes the surrounding operation fail closed
//! (refund or rejection), so parse errors carry enough context to diagnose
//! which field of which payload was short.

pub mod error;
pub mod payloads;
pub mod wire;

pub use error::{CodecError, CodecResult};
pub use payloads::{
    DepositParams, ForwardPayload, PriceAttestation, SwapParams, SwapStep, WithdrawMode,
};
pub use wire::{Reader, Writer};

/// Operation codes tagging wire payloads.
///
/// Values are stable protocol identifiers; they never change meaning across
/// versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpCode {
    /// Forward payload: routed swap instruction
    Swap = 0x9c67_4bd3,
    /// Forward payload: liquidity deposit instruction
    Deposit = 0x64cc_05d1,
    /// Burn payload: proportional withdrawal across all assets
    WithdrawBalanced = 0x1f0c_a1af,
    /// Burn payload: withdrawal into a single asset
    WithdrawSingle = 0x5c2e_8f06,
}

impl OpCode {
    pub fn from_u32(raw: u32) -> CodecResult<Self> {
        match raw {
            x if x == OpCode::Swap as u32 => Ok(OpCode::Swap),
            x if x == OpCode::Deposit as u32 => Ok(OpCode::Deposit),
            x if x == OpCode::WithdrawBalanced as u32 => Ok(OpCode::WithdrawBalanced),
            x if x == OpCode::WithdrawSingle as u32 => Ok(OpCode::WithdrawSingle),
            other => Err(CodecError::UnknownOpCode { op: other }),
        }
    }
}
