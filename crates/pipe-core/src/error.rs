// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors surfaced by batch execution.
use alloy_primitives::Address;
use thiserror::Error;

use crate::clipboard::{ClipboardError, PasteSource};
use crate::contract::Revert;
use crate::ident::BlueprintHash;
use crate::tractor::{OperatorPasteError, VerifyError};

/// Failure of one step of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The step's clipboard could not be decoded.
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    /// The clipboard carries more pastes than the composer allows.
    #[error("{count} pastes exceed the limit of {max}")]
    TooManyPastes {
        /// Pastes supplied.
        count: usize,
        /// Configured limit.
        max: usize,
    },
    /// A paste read outside its source buffer, or referenced a return entry
    /// that does not exist yet (`available` is 0 in that case).
    #[error("copy of {length} bytes at {offset} from {from} exceeds {available} available bytes")]
    CopyOutOfBounds {
        /// Source the paste read from.
        from: PasteSource,
        /// Source byte offset.
        offset: u32,
        /// Bytes requested.
        length: u32,
        /// Bytes present in the source.
        available: usize,
    },
    /// A paste wrote outside the step's calldata.
    #[error("paste of {length} bytes at {offset} exceeds calldata of {calldata_len} bytes")]
    PasteOutOfBounds {
        /// Destination byte offset.
        offset: u32,
        /// Bytes written.
        length: u32,
        /// Calldata size.
        calldata_len: usize,
    },
    /// No contract is deployed at the target address.
    #[error("no contract at {0}")]
    UnknownTarget(Address),
    /// The target reverted.
    #[error("call reverted: {0}")]
    Reverted(#[from] Revert),
}

/// Failure of a whole batch or requisition. Every variant implies that no
/// state change from the batch survived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Step `index` failed.
    #[error("step {index} failed: {source}")]
    Step {
        /// Zero-based call index.
        index: usize,
        /// What went wrong.
        source: StepError,
    },
    /// The batch has more calls than the composer allows.
    #[error("batch of {calls} calls exceeds the limit of {max}")]
    BatchTooLarge {
        /// Calls supplied.
        calls: usize,
        /// Configured limit.
        max: usize,
    },
    /// Parallel target/data arrays differ in length.
    #[error("{targets} targets but {data} calldata entries")]
    LengthMismatch {
        /// Number of targets.
        targets: usize,
        /// Number of calldata entries.
        data: usize,
    },
    /// The caller could not fund the value attached to the batch.
    #[error("payment failed: {0}")]
    Payment(Revert),
    /// The requisition failed verification.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] VerifyError),
    /// Operator paste `index` could not be applied.
    #[error("operator paste {index} failed: {source}")]
    OperatorPaste {
        /// Zero-based operator paste index.
        index: usize,
        /// What went wrong.
        source: OperatorPasteError,
    },
    /// The publisher cancelled this blueprint.
    #[error("blueprint {0} was cancelled")]
    BlueprintCancelled(BlueprintHash),
    /// The blueprint already ran `uses` times, its configured maximum.
    #[error("blueprint {hash} exhausted after {uses} uses")]
    UsesExhausted {
        /// Blueprint identity.
        hash: BlueprintHash,
        /// Successful executions so far.
        uses: u64,
    },
    /// `now` lies outside the blueprint's validity window.
    #[error("blueprint {hash} is not active at {now}")]
    BlueprintNotActive {
        /// Blueprint identity.
        hash: BlueprintHash,
        /// Timestamp supplied by the submitter.
        now: u64,
    },
    /// The registry has never seen this blueprint.
    #[error("unknown blueprint {0}")]
    UnknownBlueprint(BlueprintHash),
}

impl ExecutionError {
    /// Index of the failing step, for step failures.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Step { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The revert reason, when a target reverted.
    pub fn revert(&self) -> Option<&Revert> {
        match self {
            Self::Step {
                source: StepError::Reverted(revert),
                ..
            }
            | Self::Payment(revert) => Some(revert),
            _ => None,
        }
    }
}
