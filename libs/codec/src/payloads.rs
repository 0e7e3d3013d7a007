//! Typed payload bodies and their wire layouts.
//!
//! A forward payload attached to an asset transfer is either a swap
//! instruction (an ordered hop chain plus routing envelope) or a deposit
//! instruction, distinguished by the leading op code. A burn notification
//! carries a withdrawal mode. The oracle's attestation body is encoded here
//! so signers and verifier hash identical bytes.

use crate::{CodecError, CodecResult, OpCode, Reader, Writer};
use types::constants::MAX_COINS;
use types::{Address, Hash, TokenId, U256};

/// Longest hop chain a single swap instruction may carry.
pub const MAX_ROUTE_HOPS: usize = 16;

/// Most certificates one attestation may reference.
pub const MAX_CERTIFICATES: usize = 32;

/// One hop of a routed swap: which pool, into which token, at what floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStep {
    pub pool: Address,
    pub to_token: TokenId,
    pub limit: U256,
}

/// A routed swap instruction.
///
/// `steps` is consumed front-to-back, one pool per hop; the envelope fields
/// (`recipient`, `deadline`, payloads) ride the whole route unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub steps: Vec<SwapStep>,
    pub recipient: Address,
    pub deadline: u64,
    pub success_payload: Option<Vec<u8>>,
    pub fail_payload: Option<Vec<u8>>,
}

impl SwapParams {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u32(OpCode::Swap as u32);
        w.put_u8(self.steps.len() as u8);
        for step in &self.steps {
            w.put_address(&step.pool)
                .put_token(&step.to_token)
                .put_u256(step.limit);
        }
        w.put_address(&self.recipient)
            .put_u64(self.deadline)
            .put_opt_blob(self.success_payload.as_deref())
            .put_opt_blob(self.fail_payload.as_deref());
        w.into_bytes()
    }

    fn decode_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        let count = r.u8("swap hop count")? as usize;
        if count == 0 || count > MAX_ROUTE_HOPS {
            return Err(CodecError::CountOutOfBounds {
                got: count,
                limit: MAX_ROUTE_HOPS,
                context: "swap hop count",
            });
        }
        let mut steps = Vec::with_capacity(count);
        for _ in 0..count {
            steps.push(SwapStep {
                pool: r.address("swap hop pool")?,
                to_token: r.token("swap hop token")?,
                limit: r.u256("swap hop limit")?,
            });
        }
        Ok(Self {
            steps,
            recipient: r.address("swap recipient")?,
            deadline: r.u64("swap deadline")?,
            success_payload: r.opt_blob("swap success payload")?,
            fail_payload: r.opt_blob("swap fail payload")?,
        })
    }
}

/// A liquidity deposit instruction.
///
/// `expected_asset_count == 0` leaves the staging instance waiting for an
/// explicit commit; a nonzero count auto-commits once that many distinct
/// assets have arrived. `min_shares` is the depositor's slippage floor,
/// checked by the pool at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositParams {
    pub pool: Address,
    pub expected_asset_count: u8,
    pub min_shares: U256,
}

impl DepositParams {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u32(OpCode::Deposit as u32)
            .put_address(&self.pool)
            .put_u8(self.expected_asset_count)
            .put_u256(self.min_shares);
        w.into_bytes()
    }

    fn decode_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            pool: r.address("deposit pool")?,
            expected_asset_count: r.u8("deposit expected count")?,
            min_shares: r.u256("deposit min shares")?,
        })
    }
}

/// The instruction a vault forwards alongside an asset transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardPayload {
    Swap(SwapParams),
    Deposit(DepositParams),
}

impl ForwardPayload {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ForwardPayload::Swap(params) => params.encode(),
            ForwardPayload::Deposit(params) => params.encode(),
        }
    }

    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(bytes);
        let payload = match OpCode::from_u32(r.u32("forward payload op")?)? {
            OpCode::Swap => ForwardPayload::Swap(SwapParams::decode_body(&mut r)?),
            OpCode::Deposit => ForwardPayload::Deposit(DepositParams::decode_body(&mut r)?),
            other => {
                return Err(CodecError::UnknownOpCode { op: other as u32 });
            }
        };
        r.expect_end("forward payload")?;
        Ok(payload)
    }
}

/// How a share burn converts back into assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawMode {
    /// Proportional withdrawal; one floor per asset, pool-index order.
    Balanced { min_amounts: Vec<U256> },
    /// Everything into one asset.
    SingleCoin { index: u8, min_amount: U256 },
}

impl WithdrawMode {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        match self {
            WithdrawMode::Balanced { min_amounts } => {
                w.put_u32(OpCode::WithdrawBalanced as u32);
                w.put_u8(min_amounts.len() as u8);
                for floor in min_amounts {
                    w.put_u256(*floor);
                }
            }
            WithdrawMode::SingleCoin { index, min_amount } => {
                w.put_u32(OpCode::WithdrawSingle as u32)
                    .put_u8(*index)
                    .put_u256(*min_amount);
            }
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(bytes);
        let mode = match OpCode::from_u32(r.u32("withdraw mode op")?)? {
            OpCode::WithdrawBalanced => {
                let count = r.u8("withdraw floor count")? as usize;
                if count == 0 || count > MAX_COINS {
                    return Err(CodecError::CountOutOfBounds {
                        got: count,
                        limit: MAX_COINS,
                        context: "withdraw floor count",
                    });
                }
                let mut min_amounts = Vec::with_capacity(count);
                for _ in 0..count {
                    min_amounts.push(r.u256("withdraw floor")?);
                }
                WithdrawMode::Balanced { min_amounts }
            }
            OpCode::WithdrawSingle => WithdrawMode::SingleCoin {
                index: r.u8("withdraw coin index")?,
                min_amount: r.u256("withdraw floor")?,
            },
            other => {
                return Err(CodecError::UnknownOpCode { op: other as u32 });
            }
        };
        r.expect_end("withdraw mode")?;
        Ok(mode)
    }
}

/// The body price signers attest to.
///
/// Verifiers re-encode with [`PriceAttestation::signing_bytes`] and hash the
/// result, so any field tampering breaks every signature at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAttestation {
    pub timestamp: u64,
    pub request_hash: Hash,
    pub price: U256,
    pub certificates: Vec<Hash>,
}

impl PriceAttestation {
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u64(self.timestamp)
            .put_hash(&self.request_hash)
            .put_u256(self.price)
            .put_u8(self.certificates.len() as u8);
        for cert in &self.certificates {
            w.put_hash(cert);
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(bytes);
        let timestamp = r.u64("attestation timestamp")?;
        let request_hash = r.hash("attestation request hash")?;
        let price = r.u256("attestation price")?;
        let count = r.u8("attestation certificate count")? as usize;
        if count > MAX_CERTIFICATES {
            return Err(CodecError::CountOutOfBounds {
                got: count,
                limit: MAX_CERTIFICATES,
                context: "attestation certificate count",
            });
        }
        let mut certificates = Vec::with_capacity(count);
        for _ in 0..count {
            certificates.push(r.hash("attestation certificate")?);
        }
        r.expect_end("price attestation")?;
        Ok(Self {
            timestamp,
            request_hash,
            price,
            certificates,
        })
    }
}
