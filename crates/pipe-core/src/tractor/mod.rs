// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed blueprint execution.
//!
//! A publisher hashes and signs a [`Blueprint`] once; any operator may then
//! submit the resulting [`Requisition`] with their own operator data. Each
//! submission verifies the signature, applies the operator pastes to a copy of
//! the calls, and runs them through the composer with the publisher active.
mod blueprint;
mod operator_paste;
mod registry;
mod requisition;
mod signature;

use alloy_primitives::{Address, Bytes};
use tracing::instrument;

pub use blueprint::{hash_blueprint, Blueprint};
pub use operator_paste::{
    apply_operator_pastes, OperatorPasteError, OperatorPasteInstr, OperatorPasteSource,
};
pub use registry::{BlueprintRegistry, BlueprintStatus};
pub use requisition::Requisition;
pub use signature::{PublisherKey, Signature, VerifyError};

use crate::composer::Composer;
use crate::context::ExecutionContext;
use crate::counter::CounterStore;
use crate::error::ExecutionError;

/// Verifies and executes `requisition` for `operator`.
///
/// The batch's caller is the operator; internal functions act for the
/// publisher. Replay is unrestricted here; use [`BlueprintRegistry::tractor`]
/// for cancellation and use caps.
///
/// # Errors
/// [`ExecutionError::InvalidSignature`], [`ExecutionError::OperatorPaste`],
/// or any batch failure.
#[instrument(level = "debug", skip_all, fields(publisher = %requisition.publisher, %operator))]
pub fn execute(
    composer: &mut Composer,
    requisition: &Requisition,
    operator: Address,
    operator_data: Bytes,
    counters: &mut CounterStore,
) -> Result<Vec<Bytes>, ExecutionError> {
    requisition.verify()?;
    execute_verified(composer, requisition, operator, operator_data, counters)
}

fn execute_verified(
    composer: &mut Composer,
    requisition: &Requisition,
    operator: Address,
    operator_data: Bytes,
    counters: &mut CounterStore,
) -> Result<Vec<Bytes>, ExecutionError> {
    let calls = apply_operator_pastes(
        &requisition.blueprint,
        requisition.publisher,
        operator,
        &operator_data,
    )?;
    let mut ctx = ExecutionContext::tractor(counters, requisition.publisher, operator, operator_data);
    composer.apply(operator, &calls, &mut ctx)
}
