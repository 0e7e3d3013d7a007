//! Ed25519 signature verification over payload hashes.
//!
//! Signers sign the 32-byte Keccak digest of the attestation body, not the
//! body itself; verification is strict (malleable encodings rejected). A key
//! or signature that fails to parse is simply an invalid signature - the
//! caller counts it as absent rather than failing the whole submission.

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use types::{Hash, PublicKey, Signature};

/// `true` iff `signature` is a valid Ed25519 signature by `public_key` over
/// `payload_hash`.
pub fn verify_signature(public_key: &PublicKey, payload_hash: &Hash, signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let signature = DalekSignature::from_bytes(signature.as_bytes());
    key.verify_strict(payload_hash.as_bytes(), &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair(seed: u8) -> (SigningKey, PublicKey) {
        let signing = SigningKey::from_bytes(&[seed; 32]);
        let public = PublicKey(signing.verifying_key().to_bytes());
        (signing, public)
    }

    #[test]
    fn accepts_a_genuine_signature() {
        let (signing, public) = keypair(7);
        let hash = Hash([0x5a; 32]);
        let signature = Signature(signing.sign(hash.as_bytes()).to_bytes());
        assert!(verify_signature(&public, &hash, &signature));
    }

    #[test]
    fn rejects_wrong_message_and_wrong_key() {
        let (signing, public) = keypair(7);
        let (_, other_public) = keypair(8);
        let hash = Hash([0x5a; 32]);
        let signature = Signature(signing.sign(hash.as_bytes()).to_bytes());

        assert!(!verify_signature(&public, &Hash([0x5b; 32]), &signature));
        assert!(!verify_signature(&other_public, &hash, &signature));
    }

    #[test]
    fn garbage_key_is_just_invalid() {
        let hash = Hash([0u8; 32]);
        assert!(!verify_signature(
            &PublicKey([0xff; 32]),
            &hash,
            &Signature([0u8; 64])
        ));
    }
}
