//! # Basin Oracle - Threshold-Signed Price Attestations
//!
//! ## Purpose
//!
//! Verifies independently signed price attestations from trust-certified
//! sources and maintains the per-asset price records a pool's rates are built
//! from. An update commits only when BOTH thresholds hold: enough distinct
//! trusted signers countersigned the payload hash, and the payload references
//! enough distinct trusted source certificates. Replay is blocked by a
//! per-asset pending request hash, staleness by a timestamp window.
//!
//! ## Integration Points
//!
//! - **Input Sources**: attestation submissions (anyone may relay them - the
//!   signatures carry the authority), owner-gated trust-store administration
//! - **Output Destinations**: `send_price` builds the rates vector, in the
//!   target pool's asset order, for `Pool::update_rates`; the oracle must be
//!   configured as that pool's rates manager for the push to land
//! - **Crypto**: payload hash is Keccak-256 over the canonical attestation
//!   encoding (`codec`); signatures are Ed25519 over that hash
//!
//! ## Architecture Role
//!
//! Stateless per-call verification with `price_records` as the only
//! cross-call state. The oracle never reads pool state; the pool never
//! trusts anything but the oracle's address.

pub mod verify;

pub use verify::verify_signature;

use codec::PriceAttestation;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, warn};
use types::{Address, Hash, PublicKey, Signature, U256};

/// Attestation-verification and administration failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Caller is not the oracle owner
    #[error("caller {caller} is not authorized for {operation}")]
    Unauthorized {
        caller: Address,
        operation: &'static str,
    },

    /// Fewer distinct valid trusted signatures than the signer threshold
    #[error("{valid} valid signatures, {required} required")]
    InsufficientSignatures { valid: usize, required: u8 },

    /// Fewer distinct trusted certificates than the source threshold
    #[error("{trusted} trusted sources, {required} required")]
    InsufficientSources { trusted: usize, required: u8 },

    /// Attestation's request hash does not match the pending challenge
    #[error("request hash {got} does not match the pending challenge")]
    InvalidRequestHash { got: Hash },

    /// No pending record exists for the asset index
    #[error("no price record for asset index {asset_index}")]
    MissingPriceRecord { asset_index: u8 },

    /// Attestation timestamp is outside the staleness window
    #[error("attestation at {timestamp} is stale (now {now}, max delay {max_delay})")]
    StalePrice {
        timestamp: u64,
        now: u64,
        max_delay: u64,
    },
}

/// One committed price, plus the pending challenge that gates its next
/// update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub request_hash: Hash,
    pub timestamp: u64,
    pub price: U256,
}

/// Timestamp sentinel for bootstrap records: entries carrying it never
/// expire, and attestations carrying it bypass the staleness window.
pub const TIMESTAMP_SENTINEL: u64 = u64::MAX;

/// Oracle construction parameters.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub owner: Address,
    pub signer_threshold: u8,
    pub source_threshold: u8,
    pub max_timestamp_delay: u64,
    pub trusted_signers: BTreeSet<PublicKey>,
    pub trusted_certificates: BTreeSet<Hash>,
    pub price_records: BTreeMap<u8, PriceRecord>,
}

/// The oracle state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    owner: Address,
    signer_threshold: u8,
    source_threshold: u8,
    max_timestamp_delay: u64,
    trusted_signers: BTreeSet<PublicKey>,
    trusted_certificates: BTreeSet<Hash>,
    price_records: BTreeMap<u8, PriceRecord>,
}

impl Oracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            owner: config.owner,
            signer_threshold: config.signer_threshold,
            source_threshold: config.source_threshold,
            max_timestamp_delay: config.max_timestamp_delay,
            trusted_signers: config.trusted_signers,
            trusted_certificates: config.trusted_certificates,
            price_records: config.price_records,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn price_records(&self) -> &BTreeMap<u8, PriceRecord> {
        &self.price_records
    }

    /// Keccak-256 over the attestation's canonical encoding; the message
    /// every signer must have signed.
    pub fn payload_hash(attestation: &PriceAttestation) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(attestation.signing_bytes());
        Hash(hasher.finalize().into())
    }

    /// Verify an attestation and commit the price for `asset_index`.
    ///
    /// Checks run in order: signer threshold, source threshold, request-hash
    /// replay protection, staleness. Each failure is distinct; nothing
    /// mutates unless every check passes.
    pub fn update_price(
        &mut self,
        now: u64,
        asset_index: u8,
        signatures: &[(PublicKey, Signature)],
        attestation: &PriceAttestation,
    ) -> Result<(), OracleError> {
        let payload_hash = Self::payload_hash(attestation);

        // Distinct trusted keys with cryptographically valid signatures;
        // duplicates of the same key count once, untrusted or invalid
        // entries are simply not counted.
        let mut valid_signers: BTreeSet<PublicKey> = BTreeSet::new();
        for (public_key, signature) in signatures {
            if !self.trusted_signers.contains(public_key) {
                continue;
            }
            if verify_signature(public_key, &payload_hash, signature) {
                valid_signers.insert(*public_key);
            }
        }
        if valid_signers.len() < self.signer_threshold as usize {
            return Err(OracleError::InsufficientSignatures {
                valid: valid_signers.len(),
                required: self.signer_threshold,
            });
        }

        let trusted_sources: BTreeSet<&Hash> = attestation
            .certificates
            .iter()
            .filter(|cert| self.trusted_certificates.contains(*cert))
            .collect();
        if trusted_sources.len() < self.source_threshold as usize {
            return Err(OracleError::InsufficientSources {
                trusted: trusted_sources.len(),
                required: self.source_threshold,
            });
        }

        let record =
            self.price_records
                .get_mut(&asset_index)
                .ok_or(OracleError::MissingPriceRecord { asset_index })?;
        if attestation.request_hash != record.request_hash {
            return Err(OracleError::InvalidRequestHash {
                got: attestation.request_hash,
            });
        }

        let fresh = attestation.timestamp == TIMESTAMP_SENTINEL
            || now.saturating_sub(attestation.timestamp) <= self.max_timestamp_delay;
        if !fresh {
            return Err(OracleError::StalePrice {
                timestamp: attestation.timestamp,
                now,
                max_delay: self.max_timestamp_delay,
            });
        }

        record.timestamp = attestation.timestamp;
        record.price = attestation.price;
        debug!(asset_index, price = %attestation.price, "price record updated");
        Ok(())
    }

    /// Rates vector for a pool with `n_assets` assets, by asset index.
    ///
    /// This is the read half of `send_price`; the runtime delivers the
    /// result to `Pool::update_rates` with the oracle as caller.
    pub fn build_rates(&self, n_assets: usize) -> Result<Vec<U256>, OracleError> {
        (0..n_assets as u8)
            .map(|index| {
                self.price_records
                    .get(&index)
                    .map(|record| record.price)
                    .ok_or(OracleError::MissingPriceRecord { asset_index: index })
            })
            .collect()
    }

    // ---- owner-gated administration --------------------------------------

    pub fn update_signer_threshold(
        &mut self,
        caller: Address,
        threshold: u8,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "update_signer_threshold")?;
        self.signer_threshold = threshold;
        Ok(())
    }

    pub fn update_source_threshold(
        &mut self,
        caller: Address,
        threshold: u8,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "update_source_threshold")?;
        self.source_threshold = threshold;
        Ok(())
    }

    pub fn update_max_timestamp_delay(
        &mut self,
        caller: Address,
        delay: u64,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "update_max_timestamp_delay")?;
        self.max_timestamp_delay = delay;
        Ok(())
    }

    /// Replace the trusted signer set wholesale.
    pub fn update_trusted_signers(
        &mut self,
        caller: Address,
        signers: BTreeSet<PublicKey>,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "update_trusted_signers")?;
        self.trusted_signers = signers;
        Ok(())
    }

    /// Replace the certificate trust store wholesale.
    pub fn update_certificate_trust_store(
        &mut self,
        caller: Address,
        certificates: BTreeSet<Hash>,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "update_certificate_trust_store")?;
        self.trusted_certificates = certificates;
        Ok(())
    }

    /// Install or clear the pending challenge for an asset.
    ///
    /// Installing creates the record if absent, with the never-expiring
    /// bootstrap sentinel and a zero price until the first attestation
    /// lands; clearing removes the record, so no update can commit for that
    /// index until a new challenge is issued.
    pub fn update_request_hash(
        &mut self,
        caller: Address,
        asset_index: u8,
        request_hash: Hash,
        install: bool,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "update_request_hash")?;
        if install {
            self.price_records
                .entry(asset_index)
                .and_modify(|record| record.request_hash = request_hash)
                .or_insert(PriceRecord {
                    request_hash,
                    timestamp: TIMESTAMP_SENTINEL,
                    price: U256::zero(),
                });
        } else if self.price_records.remove(&asset_index).is_none() {
            warn!(asset_index, "cleared a request hash that was not set");
        }
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), OracleError> {
        self.require_owner(caller, "transfer_ownership")?;
        self.owner = new_owner;
        Ok(())
    }

    fn require_owner(&self, caller: Address, operation: &'static str) -> Result<(), OracleError> {
        if caller != self.owner {
            return Err(OracleError::Unauthorized { caller, operation });
        }
        Ok(())
    }
}
