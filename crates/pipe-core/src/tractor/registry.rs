// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Publication, cancellation, and use accounting for requisitions.
use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes};
use tracing::{info, instrument};

use super::requisition::Requisition;
use super::signature::VerifyError;
use super::execute_verified;
use crate::composer::Composer;
use crate::counter::CounterStore;
use crate::error::ExecutionError;
use crate::ident::BlueprintHash;

/// Registry view of one `(publisher, blueprint)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintStatus {
    /// Successful executions so far.
    pub uses: u64,
    /// Cap from the blueprint, if any.
    pub max_uses: Option<u64>,
    /// Whether the publisher cancelled it.
    pub cancelled: bool,
}

impl BlueprintStatus {
    /// Executions left before the cap; `None` when unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.max_uses.map(|max| max.saturating_sub(self.uses))
    }
}

/// Tracks requisitions and owns the counter store they execute against.
///
/// Entries are keyed by publisher and blueprint hash, so two publishers
/// signing identical blueprints never share use counts or cancellation.
/// Executing an unpublished requisition registers it implicitly.
#[derive(Debug, Default)]
pub struct BlueprintRegistry {
    counters: CounterStore,
    entries: BTreeMap<(Address, BlueprintHash), BlueprintStatus>,
}

impl BlueprintRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies and records `requisition`. Re-publishing keeps its status.
    ///
    /// # Errors
    /// [`ExecutionError::InvalidSignature`] if verification fails.
    pub fn publish(&mut self, requisition: &Requisition) -> Result<BlueprintHash, ExecutionError> {
        requisition.verify()?;
        let hash = requisition.blueprint_hash;
        self.entry(requisition);
        info!(publisher = %requisition.publisher, %hash, "blueprint published");
        Ok(hash)
    }

    /// Cancels `requisition`. Only its publisher may cancel.
    ///
    /// # Errors
    /// [`ExecutionError::InvalidSignature`] if verification fails or
    /// `caller` is not the publisher.
    pub fn cancel(&mut self, caller: Address, requisition: &Requisition) -> Result<(), ExecutionError> {
        requisition.verify()?;
        if caller != requisition.publisher {
            return Err(VerifyError::NotPublisher.into());
        }
        self.entry(requisition).cancelled = true;
        info!(publisher = %caller, hash = %requisition.blueprint_hash, "blueprint cancelled");
        Ok(())
    }

    /// Status of a known blueprint.
    ///
    /// # Errors
    /// [`ExecutionError::UnknownBlueprint`] if it was never published or executed.
    pub fn status(&self, publisher: Address, hash: BlueprintHash) -> Result<BlueprintStatus, ExecutionError> {
        self.entries
            .get(&(publisher, hash))
            .copied()
            .ok_or(ExecutionError::UnknownBlueprint(hash))
    }

    /// Successful executions of the blueprint (zero when unknown).
    pub fn nonce(&self, publisher: Address, hash: BlueprintHash) -> u64 {
        self.entries
            .get(&(publisher, hash))
            .map_or(0, |status| status.uses)
    }

    /// Counter store used by requisition execution.
    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    /// Mutable counter store used by requisition execution.
    pub fn counters_mut(&mut self) -> &mut CounterStore {
        &mut self.counters
    }

    /// Verifies, checks the validity window against `now`, cancellation and
    /// the use cap, executes, and on success records one use. A failed
    /// execution consumes nothing.
    ///
    /// # Errors
    /// Verification, [`ExecutionError::BlueprintNotActive`],
    /// [`ExecutionError::BlueprintCancelled`],
    /// [`ExecutionError::UsesExhausted`], or any execution failure.
    #[instrument(level = "debug", skip_all, fields(publisher = %requisition.publisher, %operator))]
    pub fn tractor(
        &mut self,
        composer: &mut Composer,
        requisition: &Requisition,
        operator: Address,
        operator_data: Bytes,
        now: u64,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        requisition.verify()?;
        let hash = requisition.blueprint_hash;
        if !requisition.blueprint.is_active(now) {
            return Err(ExecutionError::BlueprintNotActive { hash, now });
        }
        if let Some(status) = self.entries.get(&(requisition.publisher, hash)) {
            if status.cancelled {
                return Err(ExecutionError::BlueprintCancelled(hash));
            }
            if status.max_uses.is_some_and(|max| status.uses >= max) {
                return Err(ExecutionError::UsesExhausted {
                    hash,
                    uses: status.uses,
                });
            }
        } else if requisition.blueprint.max_uses == Some(0) {
            return Err(ExecutionError::UsesExhausted { hash, uses: 0 });
        }
        let returns = execute_verified(
            composer,
            requisition,
            operator,
            operator_data,
            &mut self.counters,
        )?;
        self.entry(requisition).uses += 1;
        Ok(returns)
    }

    fn entry(&mut self, requisition: &Requisition) -> &mut BlueprintStatus {
        self.entries
            .entry((requisition.publisher, requisition.blueprint_hash))
            .or_insert(BlueprintStatus {
                uses: 0,
                max_uses: requisition.blueprint.max_uses,
                cancelled: false,
            })
    }
}
