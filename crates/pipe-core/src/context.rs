// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-execution context.
use alloy_primitives::{Address, Bytes};

use crate::counter::CounterStore;

/// Runtime inputs threaded through one batch execution.
///
/// Plain pipes run with no publisher and no operator; requisition execution
/// fills both. The counter store is borrowed for the duration of the batch
/// and is checkpointed together with the ledger.
#[derive(Debug)]
pub struct ExecutionContext<'c> {
    /// Signer of the executing blueprint, if any.
    pub publisher: Option<Address>,
    /// Account submitting the requisition, if any.
    pub operator: Option<Address>,
    /// Free-form operator input, readable by `Operator` pastes.
    pub operator_data: Bytes,
    /// Counter store visible to internal counter functions.
    pub counters: &'c mut CounterStore,
}

impl<'c> ExecutionContext<'c> {
    /// Context for a direct (non-requisition) batch.
    pub fn direct(counters: &'c mut CounterStore) -> Self {
        Self {
            publisher: None,
            operator: None,
            operator_data: Bytes::new(),
            counters,
        }
    }

    /// Context for executing a publisher's blueprint on behalf of `operator`.
    pub fn tractor(
        counters: &'c mut CounterStore,
        publisher: Address,
        operator: Address,
        operator_data: Bytes,
    ) -> Self {
        Self {
            publisher: Some(publisher),
            operator: Some(operator),
            operator_data,
            counters,
        }
    }
}
