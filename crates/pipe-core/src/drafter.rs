// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Authoring helpers for blueprints.
//!
//! Byte offsets follow the word ABI: argument `n` of a call starts at
//! `4 + 32n`, and return word `n` starts at `32n`.
use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::abi::{encode_call, selector, word_u256};
use crate::call::{Call, Target};
use crate::clipboard::{Clipboard, PasteInstruction, PasteSource};
use crate::constants::{SELECTOR_LEN, WORD_LEN};
use crate::counter::CounterUpdate;
use crate::tractor::{Blueprint, OperatorPasteInstr, OperatorPasteSource};

/// Byte offset of argument `n` in calldata.
pub const fn arg_offset(n: u32) -> u32 {
    SELECTOR_LEN as u32 + WORD_LEN as u32 * n
}

/// Byte offset of word `n` in return data.
pub const fn return_word_offset(n: u32) -> u32 {
    WORD_LEN as u32 * n
}

/// Paste return word `word` of call `call` over argument `arg`.
pub fn paste_return_word(call: u64, word: u32, arg: u32) -> PasteInstruction {
    PasteInstruction::word(PasteSource::Return(call), return_word_offset(word), arg_offset(arg))
}

/// Paste the publisher's address word over argument `arg`.
pub fn paste_publisher(arg: u32) -> PasteInstruction {
    PasteInstruction::word(PasteSource::Publisher, 0, arg_offset(arg))
}

/// Paste operator-data word `word` over argument `arg`.
pub fn paste_operator_word(word: u32, arg: u32) -> PasteInstruction {
    PasteInstruction::word(PasteSource::Operator, return_word_offset(word), arg_offset(arg))
}

/// Operator paste writing the submitting operator's address word into
/// argument `arg` of call `call_index` (the tip-recipient pattern).
pub fn operator_address_paste(call_index: u32, arg: u32) -> OperatorPasteInstr {
    OperatorPasteInstr::word(OperatorPasteSource::Operator, call_index, arg_offset(arg))
}

/// Operator paste writing operator-data word `word` into argument `arg` of
/// call `call_index`.
pub fn operator_data_paste(word: u32, call_index: u32, arg: u32) -> OperatorPasteInstr {
    OperatorPasteInstr::word(
        OperatorPasteSource::OperatorData(return_word_offset(word)),
        call_index,
        arg_offset(arg),
    )
}

/// Authoring mistakes caught by [`BlueprintDraft::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    /// A paste or value was added before any call.
    #[error("paste added before any call")]
    NoCallToPaste,
    /// Call `call` reads the return data of a call that has not run yet.
    #[error("call {call} reads return data of call {referenced}")]
    ForwardReference {
        /// Reading call.
        call: usize,
        /// Referenced call.
        referenced: u64,
    },
    /// Operator paste `index` targets a call the draft does not have.
    #[error("operator paste {index} targets call {call_index} of {calls}")]
    OperatorPasteTarget {
        /// Operator paste index.
        index: usize,
        /// Targeted call.
        call_index: u32,
        /// Calls in the draft.
        calls: usize,
    },
    /// The validity window ends before it starts.
    #[error("window starts at {start} but ends at {end}")]
    EmptyWindow {
        /// Requested start.
        start: u64,
        /// Requested end.
        end: u64,
    },
}

#[derive(Debug, Clone)]
struct DraftCall {
    target: Target,
    data: Bytes,
    pastes: Vec<PasteInstruction>,
    value: Option<U256>,
}

/// Incremental [`Blueprint`] builder.
///
/// Pastes and values attach to the most recently added call. Structural
/// mistakes are reported once, by [`BlueprintDraft::build`].
#[derive(Debug, Clone, Default)]
pub struct BlueprintDraft {
    calls: Vec<DraftCall>,
    operator_pastes: Vec<OperatorPasteInstr>,
    max_uses: Option<u64>,
    start_time: Option<u64>,
    end_time: Option<u64>,
    metadata: Bytes,
    error: Option<DraftError>,
}

impl BlueprintDraft {
    /// An empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next added call will have.
    pub fn next_index(&self) -> u64 {
        self.calls.len() as u64
    }

    /// Appends a call.
    pub fn call(mut self, target: Target, data: Bytes) -> Self {
        self.calls.push(DraftCall {
            target,
            data,
            pastes: Vec::new(),
            value: None,
        });
        self
    }

    /// Adds a paste to the last call.
    pub fn paste(mut self, paste: PasteInstruction) -> Self {
        match self.calls.last_mut() {
            Some(call) => call.pastes.push(paste),
            None => self.fail(DraftError::NoCallToPaste),
        }
        self
    }

    /// Forwards `value` with the last call.
    pub fn value(mut self, value: U256) -> Self {
        match self.calls.last_mut() {
            Some(call) => call.value = Some(value),
            None => self.fail(DraftError::NoCallToPaste),
        }
        self
    }

    /// Adds an operator paste.
    pub fn operator_paste(mut self, paste: OperatorPasteInstr) -> Self {
        self.operator_pastes.push(paste);
        self
    }

    /// Caps successful executions.
    pub fn max_uses(mut self, max: u64) -> Self {
        self.max_uses = Some(max);
        self
    }

    /// Restricts execution to timestamps in `start..=end`.
    pub fn active_between(mut self, start: u64, end: u64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    /// Forbids execution before `start`.
    pub fn starts_at(mut self, start: u64) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Forbids execution after `end`.
    pub fn ends_at(mut self, end: u64) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Attaches opaque metadata.
    pub fn metadata(mut self, metadata: Bytes) -> Self {
        self.metadata = metadata;
        self
    }

    /// Appends the counter-guard pattern: bump the publisher's counter `id`
    /// by one, compare the new value `<= limit` on `junction`, and `check`
    /// the comparison. The requisition fails once it has run `limit` times.
    pub fn counter_guard(self, id: B256, limit: U256, junction: Address) -> Self {
        let bump = self.next_index();
        let update = encode_call(
            selector("updatePublisherCounter(bytes32,uint8,uint256)"),
            &[
                id,
                word_u256(U256::from(CounterUpdate::Increase as u8)),
                word_u256(U256::from(1u8)),
            ],
        );
        let lte = encode_call(selector("lte(uint256,uint256)"), &[B256::ZERO, word_u256(limit)]);
        let check = encode_call(selector("check(bool)"), &[B256::ZERO]);
        self.call(Target::Internal, update)
            .call(Target::External(junction), lte)
            .paste(paste_return_word(bump, 0, 0))
            .call(Target::External(junction), check)
            .paste(paste_return_word(bump + 1, 0, 0))
    }

    /// Validates and produces the blueprint.
    ///
    /// # Errors
    /// The first [`DraftError`] encountered.
    pub fn build(self) -> Result<Blueprint, DraftError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(DraftError::EmptyWindow { start, end });
            }
        }
        for (call, draft) in self.calls.iter().enumerate() {
            for paste in &draft.pastes {
                if let PasteSource::Return(referenced) = paste.source() {
                    if referenced >= call as u64 {
                        return Err(DraftError::ForwardReference { call, referenced });
                    }
                }
            }
        }
        for (index, paste) in self.operator_pastes.iter().enumerate() {
            if paste.call_index() as usize >= self.calls.len() {
                return Err(DraftError::OperatorPasteTarget {
                    index,
                    call_index: paste.call_index(),
                    calls: self.calls.len(),
                });
            }
        }
        let calls = self
            .calls
            .into_iter()
            .map(|draft| {
                let clipboard = Clipboard::from_pastes(draft.pastes, draft.value);
                Call {
                    target: draft.target,
                    data: draft.data,
                    clipboard: clipboard.encode(),
                }
            })
            .collect();
        Ok(Blueprint {
            calls,
            operator_pastes: self.operator_pastes,
            max_uses: self.max_uses,
            start_time: self.start_time,
            end_time: self.end_time,
            metadata: self.metadata,
        })
    }

    fn fail(&mut self, err: DraftError) {
        self.error.get_or_insert(err);
    }
}
