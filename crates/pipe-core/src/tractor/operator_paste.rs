// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Operator pastes: edits applied to a blueprint's calldata at submission time.
//!
//! The packed word shares the clipboard's u16/u80/u80/u80 layout:
//! `[0..2] length | [2..12] copy index | [12..22] call index | [22..32] paste index`.
//! The copy index is `2^80-1` for the publisher's address, `2^80-2` for the
//! operator's address, and otherwise an operator-data byte offset plus 32.
use alloy_primitives::{Address, Bytes, B256};
use thiserror::Error;

use super::blueprint::Blueprint;
use crate::call::Call;
use crate::clipboard::{biased, pack_word, unbiased, unpack_word, ClipboardError, PasteInstruction};
use crate::constants::{OPERATOR_SENTINEL, PUBLISHER_SENTINEL, WORD_LEN};
use crate::error::ExecutionError;

/// Where an operator paste reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatorPasteSource {
    /// The publisher's address word.
    Publisher,
    /// The submitting operator's address word.
    Operator,
    /// Operator data starting at the given byte offset.
    OperatorData(u32),
}

/// Copy `length` bytes from `source` into `calls[call_index].data` at `dest_offset`.
///
/// Address sources are left-padded 32-byte words; a shorter paste takes the
/// word's trailing bytes, so a 20-byte paste yields the raw address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "OperatorPasteFields")
)]
pub struct OperatorPasteInstr {
    source: OperatorPasteSource,
    call_index: u32,
    dest_offset: u32,
    length: u32,
}

/// Unvalidated serde form of [`OperatorPasteInstr`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct OperatorPasteFields {
    source: OperatorPasteSource,
    call_index: u32,
    dest_offset: u32,
    length: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<OperatorPasteFields> for OperatorPasteInstr {
    type Error = ClipboardError;

    fn try_from(fields: OperatorPasteFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.source,
            fields.call_index,
            fields.dest_offset,
            fields.length,
        )
    }
}

/// Why an operator paste could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OperatorPasteError {
    /// The paste targets a call the blueprint does not have.
    #[error("call index {call_index} out of range for {calls} calls")]
    CallIndexOutOfRange {
        /// Requested call.
        call_index: u32,
        /// Calls in the blueprint.
        calls: usize,
    },
    /// The paste reads outside the operator data or address word.
    #[error("copy of {length} bytes at {offset} exceeds {available} available bytes")]
    CopyOutOfBounds {
        /// Source byte offset.
        offset: u32,
        /// Bytes requested.
        length: u32,
        /// Bytes present.
        available: usize,
    },
    /// The paste writes outside the target call's calldata.
    #[error("paste of {length} bytes at {offset} exceeds calldata of {calldata_len} bytes")]
    PasteOutOfBounds {
        /// Destination byte offset.
        offset: u32,
        /// Bytes written.
        length: u32,
        /// Calldata size.
        calldata_len: usize,
    },
}

impl OperatorPasteInstr {
    /// Builds an operator paste.
    ///
    /// # Errors
    /// [`ClipboardError::InvalidLength`] unless `1 <= length <= 65535`, or
    /// `length > 32` for an address source.
    pub fn new(
        source: OperatorPasteSource,
        call_index: u32,
        dest_offset: u32,
        length: u32,
    ) -> Result<Self, ClipboardError> {
        let max = match source {
            OperatorPasteSource::OperatorData(_) => PasteInstruction::MAX_LENGTH,
            OperatorPasteSource::Publisher | OperatorPasteSource::Operator => WORD_LEN as u32,
        };
        if length == 0 || length > max {
            return Err(ClipboardError::InvalidLength(length));
        }
        Ok(Self {
            source,
            call_index,
            dest_offset,
            length,
        })
    }

    /// A full-word operator paste.
    pub fn word(source: OperatorPasteSource, call_index: u32, dest_offset: u32) -> Self {
        Self {
            source,
            call_index,
            dest_offset,
            length: WORD_LEN as u32,
        }
    }

    /// Copy source.
    pub fn source(&self) -> OperatorPasteSource {
        self.source
    }

    /// Index of the call whose calldata is edited.
    pub fn call_index(&self) -> u32 {
        self.call_index
    }

    /// Destination byte offset in that call's calldata.
    pub fn dest_offset(&self) -> u32 {
        self.dest_offset
    }

    /// Bytes copied.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Packs into the 32-byte wire word.
    pub fn pack(&self) -> B256 {
        let copy = match self.source {
            OperatorPasteSource::Publisher => PUBLISHER_SENTINEL,
            OperatorPasteSource::Operator => OPERATOR_SENTINEL,
            OperatorPasteSource::OperatorData(offset) => biased(offset),
        };
        pack_word(
            self.length,
            copy,
            u128::from(self.call_index),
            biased(self.dest_offset),
        )
    }

    /// Unpacks a 32-byte wire word.
    ///
    /// # Errors
    /// Malformed indices, or an address source longer than one word.
    pub fn unpack(word: &B256) -> Result<Self, ClipboardError> {
        let (length, copy, call_index, paste) = unpack_word(word);
        let source = match copy {
            PUBLISHER_SENTINEL => OperatorPasteSource::Publisher,
            OPERATOR_SENTINEL => OperatorPasteSource::Operator,
            offset => OperatorPasteSource::OperatorData(unbiased(offset)?),
        };
        let call_index =
            u32::try_from(call_index).map_err(|_| ClipboardError::CallIndexTooLarge(call_index))?;
        Self::new(source, call_index, unbiased(paste)?, length)
    }

    fn apply(
        &self,
        calls: &mut [Call],
        publisher: Address,
        operator: Address,
        operator_data: &[u8],
    ) -> Result<(), OperatorPasteError> {
        let calls_len = calls.len();
        let call = usize::try_from(self.call_index)
            .ok()
            .and_then(|i| calls.get_mut(i))
            .ok_or(OperatorPasteError::CallIndexOutOfRange {
                call_index: self.call_index,
                calls: calls_len,
            })?;
        let length = self.length as usize;
        let word;
        let (source, offset): (&[u8], usize) = match self.source {
            OperatorPasteSource::Publisher => {
                word = publisher.into_word();
                (word.as_slice(), WORD_LEN.saturating_sub(length))
            }
            OperatorPasteSource::Operator => {
                word = operator.into_word();
                (word.as_slice(), WORD_LEN.saturating_sub(length))
            }
            OperatorPasteSource::OperatorData(offset) => (operator_data, offset as usize),
        };
        let bytes = offset
            .checked_add(length)
            .and_then(|end| source.get(offset..end))
            .ok_or(OperatorPasteError::CopyOutOfBounds {
                offset: u32::try_from(offset).unwrap_or(u32::MAX),
                length: self.length,
                available: source.len(),
            })?;
        let mut data = call.data.to_vec();
        let calldata_len = data.len();
        let to = self.dest_offset as usize;
        to.checked_add(length)
            .and_then(|end| data.get_mut(to..end))
            .ok_or(OperatorPasteError::PasteOutOfBounds {
                offset: self.dest_offset,
                length: self.length,
                calldata_len,
            })?
            .copy_from_slice(bytes);
        call.data = Bytes::from(data);
        Ok(())
    }
}

/// Returns the blueprint's calls with every operator paste applied in order.
///
/// # Errors
/// [`ExecutionError::OperatorPaste`] naming the first paste that failed.
pub fn apply_operator_pastes(
    blueprint: &Blueprint,
    publisher: Address,
    operator: Address,
    operator_data: &[u8],
) -> Result<Vec<Call>, ExecutionError> {
    let mut calls = blueprint.calls.clone();
    for (index, paste) in blueprint.operator_pastes.iter().enumerate() {
        paste
            .apply(&mut calls, publisher, operator, operator_data)
            .map_err(|source| ExecutionError::OperatorPaste { index, source })?;
    }
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::make_address;

    fn blueprint_with(pastes: Vec<OperatorPasteInstr>) -> Blueprint {
        Blueprint {
            calls: vec![Call::internal(Bytes::from(vec![0u8; 4 + 64]))],
            operator_pastes: pastes,
            ..Blueprint::default()
        }
    }

    #[test]
    fn pack_round_trips_each_source() {
        for source in [
            OperatorPasteSource::Publisher,
            OperatorPasteSource::Operator,
            OperatorPasteSource::OperatorData(5),
        ] {
            let paste = OperatorPasteInstr::new(source, 3, 36, 20).unwrap();
            assert_eq!(OperatorPasteInstr::unpack(&paste.pack()), Ok(paste));
        }
    }

    #[test]
    fn operator_word_lands_in_calldata() {
        let operator = make_address("operator");
        let blueprint = blueprint_with(vec![OperatorPasteInstr::word(
            OperatorPasteSource::Operator,
            0,
            36,
        )]);
        let calls =
            apply_operator_pastes(&blueprint, make_address("publisher"), operator, &[]).unwrap();
        assert_eq!(&calls[0].data[36..68], operator.into_word().as_slice());
        assert!(calls[0].data[..36].iter().all(|b| *b == 0));
    }

    #[test]
    fn short_address_paste_takes_raw_address() {
        let publisher = make_address("publisher");
        let blueprint = blueprint_with(vec![OperatorPasteInstr::new(
            OperatorPasteSource::Publisher,
            0,
            4,
            20,
        )
        .unwrap()]);
        let calls = apply_operator_pastes(&blueprint, publisher, Address::ZERO, &[]).unwrap();
        assert_eq!(&calls[0].data[4..24], publisher.as_slice());
    }

    #[test]
    fn failures_name_the_paste() {
        let blueprint = blueprint_with(vec![
            OperatorPasteInstr::word(OperatorPasteSource::OperatorData(0), 0, 4),
            OperatorPasteInstr::word(OperatorPasteSource::OperatorData(0), 1, 4),
        ]);
        let err = apply_operator_pastes(&blueprint, Address::ZERO, Address::ZERO, &[9; 32])
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::OperatorPaste {
                index: 1,
                source: OperatorPasteError::CallIndexOutOfRange {
                    call_index: 1,
                    calls: 1
                }
            }
        );
    }

    #[test]
    fn short_operator_data_is_out_of_bounds() {
        let blueprint = blueprint_with(vec![OperatorPasteInstr::word(
            OperatorPasteSource::OperatorData(0),
            0,
            4,
        )]);
        let err =
            apply_operator_pastes(&blueprint, Address::ZERO, Address::ZERO, &[1; 31]).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::OperatorPaste {
                index: 0,
                source: OperatorPasteError::CopyOutOfBounds { available: 31, .. }
            }
        ));
    }
}
