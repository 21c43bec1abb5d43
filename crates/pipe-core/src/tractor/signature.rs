// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Publisher keys and blueprint signatures (Ed25519).
use alloy_primitives::{Address, B256, B512};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use thiserror::Error;

use crate::ident::{address_from_public_key, BlueprintHash};

/// Why a requisition failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The carried hash does not match the blueprint.
    #[error("blueprint hash mismatch")]
    HashMismatch,
    /// The public key is not a valid curve point.
    #[error("malformed public key")]
    MalformedKey,
    /// The signature does not verify against the hash.
    #[error("bad signature")]
    BadSignature,
    /// The signature verifies, but for a key other than the publisher's.
    #[error("signer is not the publisher")]
    SignerMismatch,
    /// The caller is not the blueprint's publisher.
    #[error("caller is not the publisher")]
    NotPublisher,
}

/// Signing half of a publisher identity.
pub struct PublisherKey(SigningKey);

impl PublisherKey {
    /// Deterministic key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(seed))
    }

    /// Compressed Ed25519 public key.
    pub fn public_key(&self) -> B256 {
        B256::from(self.0.verifying_key().to_bytes())
    }

    /// Account address derived from the public key.
    pub fn address(&self) -> Address {
        address_from_public_key(&self.0.verifying_key().to_bytes())
    }

    /// Signs a blueprint hash.
    pub fn sign(&self, hash: &BlueprintHash) -> Signature {
        Signature {
            public_key: self.public_key(),
            bytes: B512::from(self.0.sign(hash.as_bytes()).to_bytes()),
        }
    }
}

impl core::fmt::Debug for PublisherKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("PublisherKey").field(&self.address()).finish()
    }
}

/// Ed25519 signature over a [`BlueprintHash`], carrying the signer's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    /// Compressed signer public key.
    pub public_key: B256,
    /// `R || s`.
    pub bytes: B512,
}

impl Signature {
    /// Verifies the signature over `hash` and returns the signer's address.
    ///
    /// # Errors
    /// [`VerifyError::MalformedKey`] or [`VerifyError::BadSignature`].
    pub fn recover(&self, hash: &BlueprintHash) -> Result<Address, VerifyError> {
        let key =
            VerifyingKey::from_bytes(&self.public_key.0).map_err(|_| VerifyError::MalformedKey)?;
        let signature = ed25519_dalek::Signature::from_bytes(&self.bytes.0);
        key.verify_strict(hash.as_bytes(), &signature)
            .map_err(|_| VerifyError::BadSignature)?;
        Ok(address_from_public_key(&self.public_key.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recover_returns_signer_address() {
        let key = PublisherKey::from_seed(&[7; 32]);
        let hash = BlueprintHash([1; 32]);
        assert_eq!(key.sign(&hash).recover(&hash), Ok(key.address()));
    }

    #[test]
    fn tampered_hash_fails() {
        let key = PublisherKey::from_seed(&[7; 32]);
        let signature = key.sign(&BlueprintHash([1; 32]));
        assert_eq!(
            signature.recover(&BlueprintHash([2; 32])),
            Err(VerifyError::BadSignature)
        );
    }
}
