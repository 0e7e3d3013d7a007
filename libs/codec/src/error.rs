//! Parse errors with diagnostic context.
//!
//! Each variant states what was being parsed and what the buffer actually
//! held, so a failed refund or rejected burn can be traced to the exact
//! malformed field.

use thiserror::Error;

/// Payload parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer ended before the field was complete
    #[error("payload too small: need {need} bytes for {context}, {got} remain")]
    PayloadTooSmall {
        need: usize,
        got: usize,
        context: &'static str,
    },

    /// Leading op code is not part of the protocol
    #[error("unknown op code {op:#010x}")]
    UnknownOpCode { op: u32 },

    /// A tag byte had no defined meaning
    #[error("invalid tag {tag:#04x} for {context}")]
    InvalidTag { tag: u8, context: &'static str },

    /// A count prefix exceeded the protocol bound
    #[error("count {got} exceeds limit {limit} for {context}")]
    CountOutOfBounds {
        got: usize,
        limit: usize,
        context: &'static str,
    },

    /// Bytes remained after the payload was fully parsed
    #[error("{remaining} trailing bytes after {context}")]
    TrailingBytes {
        remaining: usize,
        context: &'static str,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
