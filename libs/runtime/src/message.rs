//! Envelopes flowing between instances and effects leaving the core.

use codec::SwapParams;
use pool::Payout;
use types::{Address, TokenId, U256};

/// One inter-instance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: Address,
    pub to: Address,
    pub message: Message,
}

/// Typed call bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Vault boundary: a swap-bound asset transfer landed on a pool.
    SwapNotification {
        token: TokenId,
        amount: U256,
        params: SwapParams,
    },
    /// Pool-to-pool hop forwarding; only accepted from a registered pool.
    PeerSwap {
        token: TokenId,
        amount: U256,
        params: SwapParams,
    },
    /// Vault boundary: a deposit-bound asset transfer for a staging
    /// instance.
    DepositNotification {
        owner: Address,
        token: TokenId,
        amount: U256,
        expected_asset_count: u8,
        min_shares: U256,
    },
    /// Owner-triggered commit of a staging instance.
    DepositAll { owner: Address, min_shares: U256 },
    /// Share ledger notified the pool of a burn; payload encodes the
    /// withdrawal mode.
    BurnNotification {
        owner: Address,
        shares: U256,
        payload: Vec<u8>,
    },
    /// Rates push (oracle or rates manager identified by `from`).
    UpdateRates { rates: Vec<U256> },
}

/// Outbound effects crossing the core's boundary, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Transfer instruction toward the payout sink, emitted by `source`.
    Payout { source: Address, payout: Payout },
    /// Share ledger: mint `shares` to `owner`.
    SharesMinted {
        pool: Address,
        owner: Address,
        shares: U256,
    },
    /// Share ledger: `shares` of `owner` were burned.
    SharesBurned {
        pool: Address,
        owner: Address,
        shares: U256,
    },
    /// A burn could not be executed; shares return to the owner untouched.
    BurnRejected {
        pool: Address,
        owner: Address,
        shares: U256,
        error: String,
    },
    /// A call was dropped without effect; surfaced for diagnosis.
    Rejected { to: Address, error: String },
}
