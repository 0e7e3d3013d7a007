//! Chain identities: addresses, hashes, keys, signatures and token identity.
//!
//! All identities are fixed-width byte strings with byte-exact equality. The
//! host chain's real address/signature formats are opaque to the core; the
//! only structural requirement is the deterministic staging-address
//! derivation used by the liquidity-deposit protocol.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;

/// Identity parsing failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Hex string is not the expected width for the identity type
    #[error("identity has wrong length: expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },

    /// Hex string contains non-hex characters
    #[error("identity is not valid hex: {0}")]
    InvalidHex(String),
}

macro_rules! byte_identity {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            /// All-zero identity, used as an explicit "unset" marker.
            pub const ZERO: Self = Self([0u8; $len]);

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
                let raw = hex::decode(s.trim_start_matches("0x"))
                    .map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
                let bytes: [u8; $len] =
                    raw.try_into().map_err(|v: Vec<u8>| IdentityError::WrongLength {
                        expected: $len,
                        got: v.len(),
                    })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Short form keeps log lines readable
                write!(f, "{}(0x{}..)", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }
    };
}

byte_identity!(
    /// Contract or account address on the host chain.
    Address,
    32
);

byte_identity!(
    /// 32-byte digest (payload hashes, request hashes, certificate ids).
    Hash,
    32
);

byte_identity!(
    /// Ed25519 public key of an attestation signer.
    PublicKey,
    32
);

/// Detached 64-byte signature over a payload hash.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "serde_sig")] pub [u8; 64]);

impl Signature {
    pub const LEN: usize = 64;

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl From<[u8; 64]> for Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

/// Serde helper: 64-byte arrays lack built-in impls, route through a Vec.
mod serde_sig {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], ser: S) -> Result<S::Ok, S::Error> {
        bytes.as_slice().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 64], D::Error> {
        let raw = Vec::<u8>::deserialize(de)?;
        raw.try_into()
            .map_err(|v: Vec<u8>| serde::de::Error::invalid_length(v.len(), &"64 bytes"))
    }
}

/// Identity of one pool-held token.
///
/// The native chain currency has no contract address, so it gets a dedicated
/// marker; every other asset is identified by its token-contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenId {
    /// The chain's native currency.
    Native,
    /// A token contract.
    Contract(Address),
}

impl TokenId {
    pub fn is_native(&self) -> bool {
        matches!(self, TokenId::Native)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenId::Native => write!(f, "native"),
            TokenId::Contract(addr) => write!(f, "{addr}"),
        }
    }
}

/// Domain-separation tag for staging-address derivation.
const STAGING_DOMAIN: &[u8] = b"basin/liquidity-deposit/v1";

/// Deterministic address of the liquidity-deposit staging instance for
/// `(owner, pool)`.
///
/// The derivation is pure and collision-resistant (Keccak-256 over a
/// domain-separated concatenation), so every deposit notification from the
/// same owner toward the same pool resolves to the same aggregator, and the
/// pool can recompute the address to authorize `update_reserves` callers.
pub fn derive_staging_address(owner: &Address, pool: &Address) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update(STAGING_DOMAIN);
    hasher.update(owner.as_bytes());
    hasher.update(pool.as_bytes());
    Address(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 32])
    }

    #[test]
    fn staging_address_is_deterministic() {
        let owner = addr(1);
        let pool = addr(2);
        assert_eq!(
            derive_staging_address(&owner, &pool),
            derive_staging_address(&owner, &pool),
        );
    }

    #[test]
    fn staging_address_separates_inputs() {
        let owner = addr(1);
        let pool = addr(2);
        let base = derive_staging_address(&owner, &pool);
        assert_ne!(base, derive_staging_address(&pool, &owner));
        assert_ne!(base, derive_staging_address(&owner, &addr(3)));
        assert_ne!(base, owner);
        assert_ne!(base, pool);
    }

    #[test]
    fn hex_round_trip() {
        let a = addr(0xab);
        let parsed = Address::from_hex(&a.to_string()).unwrap();
        assert_eq!(a, parsed);

        assert_eq!(
            Address::from_hex("0x1234"),
            Err(IdentityError::WrongLength { expected: 32, got: 2 })
        );
        assert!(matches!(
            Address::from_hex("zz"),
            Err(IdentityError::InvalidHex(_))
        ));
    }

    #[test]
    fn signature_serde_round_trip() {
        let sig = Signature([7u8; 64]);
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }
}
