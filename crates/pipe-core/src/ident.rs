// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use alloy_primitives::{keccak256, Address, B256};
use blake3::Hasher;

/// Canonical 256-bit digest used for blueprint identity and state digests.
pub type Hash = [u8; 32];

/// Canonical identity of a [`crate::Blueprint`].
///
/// Produced by [`crate::hash_blueprint`]; this is the exact message a
/// publisher signs. The `Display` impl renders lowercase hex.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlueprintHash(pub Hash);

impl BlueprintHash {
    /// Returns the canonical byte representation of this hash.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl core::fmt::Display for BlueprintHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BlueprintHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BlueprintHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let text = String::deserialize(deserializer)?;
        let digits = text.strip_prefix("0x").unwrap_or(&text);
        let mut out = [0u8; 32];
        hex::decode_to_slice(digits, &mut out).map_err(D::Error::custom)?;
        Ok(Self(out))
    }
}

/// Produces a stable, domain-separated counter identifier (prefix `b"counter:"`) using BLAKE3.
pub fn make_counter_id(label: &str) -> B256 {
    let mut hasher = Hasher::new();
    hasher.update(b"counter:");
    hasher.update(label.as_bytes());
    B256::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Produces a stable, domain-separated address (prefix `b"address:"`) using BLAKE3.
///
/// Handy for fixtures and demos that need readable, collision-free accounts.
pub fn make_address(label: &str) -> Address {
    let mut hasher = Hasher::new();
    hasher.update(b"address:");
    hasher.update(label.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    Address::from_slice(&digest[12..])
}

/// Derives an account address from a 32-byte public key: the low 20 bytes of
/// `keccak256(public_key)`.
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let digest = keccak256(public_key);
    Address::from_slice(&digest[12..])
}
