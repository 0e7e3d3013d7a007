//! Threshold-verification matrix for price attestations.

use codec::PriceAttestation;
use ed25519_dalek::{Signer, SigningKey};
use oracle::{Oracle, OracleConfig, OracleError, PriceRecord, TIMESTAMP_SENTINEL};
use std::collections::{BTreeMap, BTreeSet};
use types::{Address, Hash, PublicKey, Signature, U256};

const NOW: u64 = 1_700_000_000;
const MAX_DELAY: u64 = 120;

fn addr(byte: u8) -> Address {
    Address([byte; 32])
}

fn keypair(seed: u8) -> (SigningKey, PublicKey) {
    let signing = SigningKey::from_bytes(&[seed; 32]);
    let public = PublicKey(signing.verifying_key().to_bytes());
    (signing, public)
}

fn request_hash() -> Hash {
    Hash([0xc2; 32])
}

fn certificates() -> Vec<Hash> {
    vec![Hash([0x25; 32]), Hash([0xdb; 32])]
}

fn oracle() -> Oracle {
    let (_, signer_a) = keypair(1);
    let (_, signer_b) = keypair(2);

    let mut price_records = BTreeMap::new();
    price_records.insert(
        0,
        PriceRecord {
            request_hash: Hash::ZERO,
            timestamp: TIMESTAMP_SENTINEL,
            price: U256::from(1_000_000_000u64),
        },
    );
    price_records.insert(
        1,
        PriceRecord {
            request_hash: request_hash(),
            timestamp: 0,
            price: U256::zero(),
        },
    );

    Oracle::new(OracleConfig {
        owner: addr(0x0a),
        signer_threshold: 2,
        source_threshold: 1,
        max_timestamp_delay: MAX_DELAY,
        trusted_signers: [signer_a, signer_b].into_iter().collect(),
        trusted_certificates: certificates().into_iter().collect(),
        price_records,
    })
}

fn attestation(price: u64) -> PriceAttestation {
    PriceAttestation {
        timestamp: NOW - 10,
        request_hash: request_hash(),
        price: U256::from(price),
        certificates: certificates(),
    }
}

fn sign(attestation: &PriceAttestation, seeds: &[u8]) -> Vec<(PublicKey, Signature)> {
    let hash = Oracle::payload_hash(attestation);
    seeds
        .iter()
        .map(|seed| {
            let (signing, public) = keypair(*seed);
            (public, Signature(signing.sign(hash.as_bytes()).to_bytes()))
        })
        .collect()
}

#[test]
fn two_of_two_signatures_with_trusted_source_commits() {
    let mut oracle = oracle();
    let attestation = attestation(500);
    let signatures = sign(&attestation, &[1, 2]);

    oracle
        .update_price(NOW, 1, &signatures, &attestation)
        .unwrap();

    let record = &oracle.price_records()[&1];
    assert_eq!(record.price, U256::from(500u64));
    assert_eq!(record.timestamp, NOW - 10);
    assert_eq!(record.request_hash, request_hash());
}

#[test]
fn one_of_two_signatures_is_insufficient() {
    let mut oracle = oracle();
    let attestation = attestation(500);
    let signatures = sign(&attestation, &[1]);

    let err = oracle
        .update_price(NOW, 1, &signatures, &attestation)
        .unwrap_err();
    assert_eq!(
        err,
        OracleError::InsufficientSignatures {
            valid: 1,
            required: 2
        }
    );
    assert_eq!(oracle.price_records()[&1].price, U256::zero());
}

#[test]
fn duplicate_signers_count_once() {
    let mut oracle = oracle();
    let attestation = attestation(500);
    let signatures = sign(&attestation, &[1, 1, 1]);

    let err = oracle
        .update_price(NOW, 1, &signatures, &attestation)
        .unwrap_err();
    assert!(matches!(
        err,
        OracleError::InsufficientSignatures { valid: 1, .. }
    ));
}

#[test]
fn untrusted_signers_are_not_counted() {
    let mut oracle = oracle();
    let attestation = attestation(500);
    // seed 9 is a valid keypair but not in the trust set
    let signatures = sign(&attestation, &[1, 9]);

    let err = oracle
        .update_price(NOW, 1, &signatures, &attestation)
        .unwrap_err();
    assert!(matches!(
        err,
        OracleError::InsufficientSignatures { valid: 1, .. }
    ));
}

#[test]
fn tampered_payload_invalidates_every_signature() {
    let mut oracle = oracle();
    let signed_over = attestation(500);
    let signatures = sign(&signed_over, &[1, 2]);

    // Submit a different payload than the one that was signed.
    let submitted = attestation(501);
    let err = oracle
        .update_price(NOW, 1, &signatures, &submitted)
        .unwrap_err();
    assert!(matches!(
        err,
        OracleError::InsufficientSignatures { valid: 0, .. }
    ));
}

#[test]
fn untrusted_certificates_fail_the_source_threshold() {
    let mut oracle = oracle();
    let mut attestation = attestation(500);
    attestation.certificates = vec![Hash([0x44; 32])];
    let signatures = sign(&attestation, &[1, 2]);

    let err = oracle
        .update_price(NOW, 1, &signatures, &attestation)
        .unwrap_err();
    assert_eq!(
        err,
        OracleError::InsufficientSources {
            trusted: 0,
            required: 1
        }
    );
}

#[test]
fn wrong_request_hash_is_replay_rejected() {
    let mut oracle = oracle();
    let mut attestation = attestation(500);
    attestation.request_hash = Hash([0x77; 32]);
    let signatures = sign(&attestation, &[1, 2]);

    let err = oracle
        .update_price(NOW, 1, &signatures, &attestation)
        .unwrap_err();
    assert_eq!(
        err,
        OracleError::InvalidRequestHash {
            got: Hash([0x77; 32])
        }
    );
}

#[test]
fn stale_attestations_are_rejected_and_sentinel_bypasses() {
    let mut oracle = oracle();
    let mut stale = attestation(500);
    stale.timestamp = NOW - MAX_DELAY - 1;
    let signatures = sign(&stale, &[1, 2]);

    let err = oracle.update_price(NOW, 1, &signatures, &stale).unwrap_err();
    assert!(matches!(err, OracleError::StalePrice { .. }));

    let mut bootstrap = attestation(777);
    bootstrap.timestamp = TIMESTAMP_SENTINEL;
    let signatures = sign(&bootstrap, &[1, 2]);
    oracle.update_price(NOW, 1, &signatures, &bootstrap).unwrap();
    assert_eq!(oracle.price_records()[&1].price, U256::from(777u64));
}

#[test]
fn missing_record_cannot_be_updated() {
    let mut oracle = oracle();
    let attestation = attestation(500);
    let signatures = sign(&attestation, &[1, 2]);

    let err = oracle
        .update_price(NOW, 7, &signatures, &attestation)
        .unwrap_err();
    assert_eq!(err, OracleError::MissingPriceRecord { asset_index: 7 });
}

#[test]
fn failed_updates_leave_the_record_untouched() {
    let mut oracle = oracle();
    let before = oracle.price_records()[&1].clone();

    let attestation = attestation(500);
    let _ = oracle.update_price(NOW, 1, &sign(&attestation, &[1]), &attestation);

    assert_eq!(oracle.price_records()[&1], before);
}

#[test]
fn build_rates_follows_asset_index_order() {
    let oracle = oracle();
    assert_eq!(
        oracle.build_rates(2).unwrap(),
        vec![U256::from(1_000_000_000u64), U256::zero()]
    );
    assert_eq!(
        oracle.build_rates(3).unwrap_err(),
        OracleError::MissingPriceRecord { asset_index: 2 }
    );
}

#[test]
fn administration_is_owner_gated() {
    let mut oracle = oracle();
    let owner = addr(0x0a);
    let stranger = addr(0x0b);

    assert!(matches!(
        oracle.update_signer_threshold(stranger, 1),
        Err(OracleError::Unauthorized { .. })
    ));
    assert!(matches!(
        oracle.update_trusted_signers(stranger, BTreeSet::new()),
        Err(OracleError::Unauthorized { .. })
    ));
    assert!(matches!(
        oracle.update_certificate_trust_store(stranger, BTreeSet::new()),
        Err(OracleError::Unauthorized { .. })
    ));
    assert!(matches!(
        oracle.update_request_hash(stranger, 0, Hash::ZERO, true),
        Err(OracleError::Unauthorized { .. })
    ));
    assert!(matches!(
        oracle.transfer_ownership(stranger, stranger),
        Err(OracleError::Unauthorized { .. })
    ));

    // Lowering the signer threshold makes a single signature sufficient.
    oracle.update_signer_threshold(owner, 1).unwrap();
    let attestation = attestation(123);
    oracle
        .update_price(NOW, 1, &sign(&attestation, &[1]), &attestation)
        .unwrap();
    assert_eq!(oracle.price_records()[&1].price, U256::from(123u64));

    // Ownership hand-off moves the gate.
    oracle.transfer_ownership(owner, stranger).unwrap();
    assert!(oracle.update_signer_threshold(owner, 2).is_err());
    assert!(oracle.update_signer_threshold(stranger, 2).is_ok());
}

#[test]
fn request_hash_install_and_clear() {
    let mut oracle = oracle();
    let owner = addr(0x0a);

    oracle
        .update_request_hash(owner, 4, Hash([0x99; 32]), true)
        .unwrap();
    let record = &oracle.price_records()[&4];
    assert_eq!(record.request_hash, Hash([0x99; 32]));
    assert_eq!(record.timestamp, TIMESTAMP_SENTINEL);

    oracle
        .update_request_hash(owner, 4, Hash::ZERO, false)
        .unwrap();
    assert!(!oracle.price_records().contains_key(&4));
}
