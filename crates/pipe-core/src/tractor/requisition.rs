// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed blueprints.
use alloy_primitives::Address;

use super::blueprint::{hash_blueprint, Blueprint};
use super::signature::{PublisherKey, Signature, VerifyError};
use crate::ident::BlueprintHash;

/// A blueprint together with its publisher's signature over its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Requisition {
    /// The signed template.
    pub blueprint: Blueprint,
    /// Claimed signer.
    pub publisher: Address,
    /// Claimed hash of `blueprint`.
    pub blueprint_hash: BlueprintHash,
    /// Signature over `blueprint_hash`.
    pub signature: Signature,
}

impl Requisition {
    /// Hashes and signs `blueprint` with `key`.
    pub fn sign(blueprint: Blueprint, key: &PublisherKey) -> Self {
        let blueprint_hash = hash_blueprint(&blueprint);
        Self {
            signature: key.sign(&blueprint_hash),
            publisher: key.address(),
            blueprint_hash,
            blueprint,
        }
    }

    /// Checks that the hash matches the blueprint and that the publisher
    /// signed it.
    ///
    /// # Errors
    /// See [`VerifyError`].
    pub fn verify(&self) -> Result<(), VerifyError> {
        if hash_blueprint(&self.blueprint) != self.blueprint_hash {
            return Err(VerifyError::HashMismatch);
        }
        let signer = self.signature.recover(&self.blueprint_hash)?;
        if signer != self.publisher {
            return Err(VerifyError::SignerMismatch);
        }
        Ok(())
    }
}
