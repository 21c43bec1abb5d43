// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Functions hosted by the composer itself.
//!
//! `Target::Internal` calls are routed by selector to a table of plain
//! function pointers. Unlike external calls, an internal function sees the
//! original caller (or the active publisher) rather than the composer, which
//! is what lets counters and internal balances be keyed by the right account.
use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};

use crate::abi::Selector;
use crate::composer::dispatch_external;
use crate::contract::{Contract, Revert};
use crate::counter::CounterStore;
use crate::error::StepError;
use crate::ledger::Ledger;

/// Handler for an internal function. Receives the full calldata, selector included.
pub type InternalFn = for<'a> fn(&mut InternalFrame<'a>, &[u8]) -> Result<Bytes, Revert>;

/// Registered internal function.
#[derive(Debug, Clone, Copy)]
pub struct InternalFunction {
    /// Canonical signature, e.g. `"getPublisherCounter(bytes32)"`.
    pub signature: &'static str,
    /// Dispatch selector derived from `signature`.
    pub selector: Selector,
    /// Implementation.
    pub handler: InternalFn,
}

/// Execution frame for an internal function.
pub struct InternalFrame<'a> {
    pub(crate) host: Address,
    pub(crate) caller: Address,
    pub(crate) publisher: Option<Address>,
    pub(crate) operator: Option<Address>,
    pub(crate) value: U256,
    pub(crate) ledger: &'a mut Ledger,
    pub(crate) contracts: &'a BTreeMap<Address, Arc<dyn Contract>>,
    pub(crate) counters: &'a mut CounterStore,
}

impl InternalFrame<'_> {
    /// Address of the hosting composer.
    pub fn host(&self) -> Address {
        self.host
    }

    /// Account that submitted the batch.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Active publisher, during requisition execution.
    pub fn publisher(&self) -> Option<Address> {
        self.publisher
    }

    /// Submitting operator, during requisition execution.
    pub fn operator(&self) -> Option<Address> {
        self.operator
    }

    /// The account this call acts for: the publisher if one is active,
    /// otherwise the caller.
    pub fn account(&self) -> Address {
        self.publisher.unwrap_or(self.caller)
    }

    /// Value attached by the clipboard. It stays with the host.
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Reads a slot of the host's storage.
    pub fn load(&self, slot: B256) -> B256 {
        self.ledger.load(self.host, slot)
    }

    /// Writes a slot of the host's storage.
    pub fn store(&mut self, slot: B256, value: B256) {
        self.ledger.store(self.host, slot, value);
    }

    /// Counter store of the current execution.
    pub fn counters(&self) -> &CounterStore {
        &*self.counters
    }

    /// Mutable counter store of the current execution.
    pub fn counters_mut(&mut self) -> &mut CounterStore {
        &mut *self.counters
    }

    /// Calls a deployed contract with the host as caller, sending `value`
    /// from the host's native balance. Effects of a failed call are undone
    /// before this returns.
    pub fn call(&mut self, target: Address, data: &[u8], value: U256) -> Result<Bytes, Revert> {
        dispatch_external(&mut *self.ledger, self.contracts, self.host, target, data, value).map_err(
            |err| match err {
                StepError::Reverted(revert) => revert,
                other => Revert::Reason(other.to_string()),
            },
        )
    }
}
