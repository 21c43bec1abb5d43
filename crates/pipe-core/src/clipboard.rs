// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Clipboard codec: the per-call copy/paste and value-forwarding instructions.
//!
//! Wire layout (all integers big-endian):
//!
//! ```text
//! header        [0] type (0 NoCopy, 1 CopySingle, 2 CopyMulti)
//!               [1] value flag (0 or 1)
//! NoCopy        header [value word]
//! CopySingle    header paste_word [value word]
//! CopyMulti     header 0x20 len paste_word*len [value word]
//!
//! paste_word    [0..2]   length (u16; 0 means a full 32-byte word)
//!               [2..12]  source (u80; 2^80-1 publisher, 2^80-2 operator,
//!                        otherwise a return-buffer index)
//!               [12..22] copy index (u80; byte offset + 32)
//!               [22..32] paste index (u80; byte offset + 32)
//! ```
//!
//! Decoding is slightly lenient for legacy producers: an empty clipboard is a
//! plain `NoCopy`, and a `NoCopy` header without the value flag ignores any
//! trailing bytes. Encoding always emits the canonical form.
use alloy_primitives::{Bytes, B256, U256};
use thiserror::Error;

use crate::abi::{u256_to_usize, word_to_u256, word_u256, word_usize};
use crate::constants::{INDEX_BIAS, OPERATOR_SENTINEL, PUBLISHER_SENTINEL, U80_MAX, WORD_LEN};

const HEADER_LEN: usize = 2;

/// Discriminant stored in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClipboardType {
    /// No pastes.
    NoCopy = 0,
    /// Exactly one paste word.
    CopySingle = 1,
    /// A dynamic array of paste words.
    CopyMulti = 2,
}

impl TryFrom<u8> for ClipboardType {
    type Error = ClipboardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NoCopy),
            1 => Ok(Self::CopySingle),
            2 => Ok(Self::CopyMulti),
            other => Err(ClipboardError::InvalidClipboardType(other)),
        }
    }
}

/// Where a paste copies its bytes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PasteSource {
    /// Return data of an earlier call in the same batch.
    Return(u64),
    /// The active publisher's address as a left-padded word.
    Publisher,
    /// The operator's free-form data supplied at execution time.
    Operator,
}

impl PasteSource {
    fn to_wire(self) -> u128 {
        match self {
            Self::Return(index) => u128::from(index),
            Self::Publisher => PUBLISHER_SENTINEL,
            Self::Operator => OPERATOR_SENTINEL,
        }
    }

    /// Return indices past `u64` saturate; no batch reaches them, so the
    /// paste fails at resolution as an out-of-bounds copy.
    fn from_wire(raw: u128) -> Self {
        match raw {
            PUBLISHER_SENTINEL => Self::Publisher,
            OPERATOR_SENTINEL => Self::Operator,
            index => Self::Return(u64::try_from(index).unwrap_or(u64::MAX)),
        }
    }
}

impl core::fmt::Display for PasteSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Return(index) => write!(f, "return[{index}]"),
            Self::Publisher => f.write_str("publisher"),
            Self::Operator => f.write_str("operator data"),
        }
    }
}

/// Copy `length` bytes from `source` at `source_offset` into the call's
/// calldata at `dest_offset`.
///
/// Offsets are plain byte offsets into the respective buffers; the wire bias
/// is applied only by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PasteFields")
)]
pub struct PasteInstruction {
    source: PasteSource,
    source_offset: u32,
    dest_offset: u32,
    length: u32,
}

impl PasteInstruction {
    /// Largest encodable paste length.
    pub const MAX_LENGTH: u32 = u16::MAX as u32;

    /// Builds a paste instruction.
    ///
    /// # Errors
    /// [`ClipboardError::InvalidLength`] unless `1 <= length <= 65535`.
    pub fn new(
        source: PasteSource,
        source_offset: u32,
        dest_offset: u32,
        length: u32,
    ) -> Result<Self, ClipboardError> {
        if length == 0 || length > Self::MAX_LENGTH {
            return Err(ClipboardError::InvalidLength(length));
        }
        Ok(Self {
            source,
            source_offset,
            dest_offset,
            length,
        })
    }

    /// A full 32-byte word paste.
    pub fn word(source: PasteSource, source_offset: u32, dest_offset: u32) -> Self {
        Self {
            source,
            source_offset,
            dest_offset,
            length: WORD_LEN as u32,
        }
    }

    /// Copy source.
    pub fn source(&self) -> PasteSource {
        self.source
    }

    /// Byte offset into the source buffer.
    pub fn source_offset(&self) -> u32 {
        self.source_offset
    }

    /// Byte offset into the destination calldata.
    pub fn dest_offset(&self) -> u32 {
        self.dest_offset
    }

    /// Number of bytes copied.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Packs this instruction into its 32-byte wire word.
    pub fn pack(&self) -> B256 {
        pack_word(
            self.length,
            self.source.to_wire(),
            biased(self.source_offset),
            biased(self.dest_offset),
        )
    }

    /// Unpacks a 32-byte wire word.
    ///
    /// # Errors
    /// Index fields below one word and offsets beyond `u32` are rejected.
    pub fn unpack(word: &B256) -> Result<Self, ClipboardError> {
        let (length, source, copy, paste) = unpack_word(word);
        Self::new(
            PasteSource::from_wire(source),
            unbiased(copy)?,
            unbiased(paste)?,
            length,
        )
    }
}

/// Unvalidated serde form of [`PasteInstruction`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PasteFields {
    source: PasteSource,
    source_offset: u32,
    dest_offset: u32,
    length: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<PasteFields> for PasteInstruction {
    type Error = ClipboardError;

    fn try_from(fields: PasteFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.source,
            fields.source_offset,
            fields.dest_offset,
            fields.length,
        )
    }
}

/// Packs `length | a | b | c` with the shared u16/u80/u80/u80 layout.
/// A length of one full word is written as 0. Callers hold `1..=65535`.
pub(crate) fn pack_word(length: u32, a: u128, b: u128, c: u128) -> B256 {
    debug_assert!((1..=PasteInstruction::MAX_LENGTH).contains(&length));
    let mut out = [0u8; WORD_LEN];
    let length = if length == WORD_LEN as u32 {
        0
    } else {
        u16::try_from(length).unwrap_or(u16::MAX)
    };
    out[0..2].copy_from_slice(&length.to_be_bytes());
    out[2..12].copy_from_slice(&(a & U80_MAX).to_be_bytes()[6..]);
    out[12..22].copy_from_slice(&(b & U80_MAX).to_be_bytes()[6..]);
    out[22..32].copy_from_slice(&(c & U80_MAX).to_be_bytes()[6..]);
    B256::from(out)
}

/// Inverse of [`pack_word`]; a zero length decodes as one full word.
pub(crate) fn unpack_word(word: &B256) -> (u32, u128, u128, u128) {
    let field = |range: core::ops::Range<usize>| {
        let mut buf = [0u8; 16];
        buf[6..].copy_from_slice(&word[range]);
        u128::from_be_bytes(buf)
    };
    let length = u32::from(u16::from_be_bytes([word[0], word[1]]));
    let length = if length == 0 { WORD_LEN as u32 } else { length };
    (length, field(2..12), field(12..22), field(22..32))
}

pub(crate) fn biased(offset: u32) -> u128 {
    u128::from(offset) + INDEX_BIAS
}

pub(crate) fn unbiased(wire: u128) -> Result<u32, ClipboardError> {
    let offset = wire
        .checked_sub(INDEX_BIAS)
        .ok_or(ClipboardError::IndexBelowWord(wire))?;
    u32::try_from(offset).map_err(|_| ClipboardError::OffsetTooLarge(wire))
}

/// Decoded clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clipboard {
    /// No pastes; optionally forwards value.
    NoCopy {
        /// Native value forwarded with the call.
        value: Option<U256>,
    },
    /// One paste.
    CopySingle {
        /// The paste to apply.
        paste: PasteInstruction,
        /// Native value forwarded with the call.
        value: Option<U256>,
    },
    /// Any number of pastes, applied in order.
    CopyMulti {
        /// Pastes to apply, in order.
        pastes: Vec<PasteInstruction>,
        /// Native value forwarded with the call.
        value: Option<U256>,
    },
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::NoCopy { value: None }
    }
}

impl Clipboard {
    /// A clipboard that only forwards `value`.
    pub fn value(value: U256) -> Self {
        Self::NoCopy { value: Some(value) }
    }

    /// Picks the smallest variant able to hold `pastes`.
    pub fn from_pastes(mut pastes: Vec<PasteInstruction>, value: Option<U256>) -> Self {
        match pastes.len() {
            0 => Self::NoCopy { value },
            1 => match pastes.pop() {
                Some(paste) => Self::CopySingle { paste, value },
                None => Self::NoCopy { value },
            },
            _ => Self::CopyMulti { pastes, value },
        }
    }

    /// Wire discriminant of this clipboard.
    pub fn kind(&self) -> ClipboardType {
        match self {
            Self::NoCopy { .. } => ClipboardType::NoCopy,
            Self::CopySingle { .. } => ClipboardType::CopySingle,
            Self::CopyMulti { .. } => ClipboardType::CopyMulti,
        }
    }

    /// Pastes in application order.
    pub fn pastes(&self) -> &[PasteInstruction] {
        match self {
            Self::NoCopy { .. } => &[],
            Self::CopySingle { paste, .. } => core::slice::from_ref(paste),
            Self::CopyMulti { pastes, .. } => pastes,
        }
    }

    /// Forwarded value, if the value flag is set.
    pub fn attached_value(&self) -> Option<U256> {
        match self {
            Self::NoCopy { value }
            | Self::CopySingle { value, .. }
            | Self::CopyMulti { value, .. } => *value,
        }
    }

    /// Canonical wire encoding.
    pub fn encode(&self) -> Bytes {
        let value = self.attached_value();
        let mut out = vec![self.kind() as u8, u8::from(value.is_some())];
        match self {
            Self::NoCopy { .. } => {}
            Self::CopySingle { paste, .. } => out.extend_from_slice(paste.pack().as_slice()),
            Self::CopyMulti { pastes, .. } => {
                out.extend_from_slice(word_usize(WORD_LEN).as_slice());
                out.extend_from_slice(word_usize(pastes.len()).as_slice());
                for paste in pastes {
                    out.extend_from_slice(paste.pack().as_slice());
                }
            }
        }
        if let Some(value) = value {
            out.extend_from_slice(word_u256(value).as_slice());
        }
        out.into()
    }

    /// Decodes a wire clipboard.
    ///
    /// # Errors
    /// See [`ClipboardError`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ClipboardError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        if bytes.len() < HEADER_LEN {
            return Err(ClipboardError::ClipboardLength {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let kind = ClipboardType::try_from(bytes[0])?;
        let has_value = match bytes[1] {
            0 => false,
            1 => true,
            other => return Err(ClipboardError::InvalidValueFlag(other)),
        };
        let value_len = if has_value { WORD_LEN } else { 0 };
        let body = &bytes[HEADER_LEN..];

        let (clipboard, consumed) = match kind {
            ClipboardType::NoCopy => {
                if !has_value {
                    return Ok(Self::NoCopy { value: None });
                }
                (Self::NoCopy { value: None }, 0)
            }
            ClipboardType::CopySingle => {
                let word = read_word(body, 0, HEADER_LEN + WORD_LEN + value_len, bytes.len())?;
                let paste = PasteInstruction::unpack(&word)?;
                (Self::CopySingle { paste, value: None }, WORD_LEN)
            }
            ClipboardType::CopyMulti => {
                let min = HEADER_LEN + 2 * WORD_LEN + value_len;
                let offset = read_word(body, 0, min, bytes.len())?;
                if word_to_u256(&offset) != U256::from(WORD_LEN) {
                    return Err(ClipboardError::NonCanonicalArray);
                }
                let count = u256_to_usize(word_to_u256(&read_word(body, WORD_LEN, min, bytes.len())?))
                    .ok_or(ClipboardError::NonCanonicalArray)?;
                let array_len = count
                    .checked_mul(WORD_LEN)
                    .and_then(|n| n.checked_add(2 * WORD_LEN))
                    .ok_or(ClipboardError::NonCanonicalArray)?;
                let expected = HEADER_LEN + array_len + value_len;
                if bytes.len() != expected {
                    return Err(ClipboardError::ClipboardLength {
                        expected,
                        actual: bytes.len(),
                    });
                }
                let pastes = (0..count)
                    .map(|i| {
                        let word = read_word(body, (i + 2) * WORD_LEN, expected, bytes.len())?;
                        PasteInstruction::unpack(&word)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (Self::CopyMulti { pastes, value: None }, array_len)
            }
        };

        let expected = HEADER_LEN + consumed + value_len;
        if bytes.len() != expected {
            return Err(ClipboardError::ClipboardLength {
                expected,
                actual: bytes.len(),
            });
        }
        let value = has_value.then(|| word_to_u256(&B256::from_slice(&body[consumed..])));
        Ok(clipboard.with_value(value))
    }

    fn with_value(self, value: Option<U256>) -> Self {
        match self {
            Self::NoCopy { .. } => Self::NoCopy { value },
            Self::CopySingle { paste, .. } => Self::CopySingle { paste, value },
            Self::CopyMulti { pastes, .. } => Self::CopyMulti { pastes, value },
        }
    }
}

fn read_word(body: &[u8], at: usize, expected: usize, actual: usize) -> Result<B256, ClipboardError> {
    body.get(at..at + WORD_LEN)
        .map(B256::from_slice)
        .ok_or(ClipboardError::ClipboardLength { expected, actual })
}

/// Clipboard decoding and construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// Header type byte is not 0, 1, or 2.
    #[error("invalid clipboard type {0}")]
    InvalidClipboardType(u8),
    /// Header value flag is not 0 or 1.
    #[error("invalid clipboard value flag {0}")]
    InvalidValueFlag(u8),
    /// Total length does not match the header.
    #[error("clipboard length {actual}, expected {expected}")]
    ClipboardLength {
        /// Length implied by the header and array length.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
    /// CopyMulti array head is not the canonical `0x20` offset, or its length
    /// cannot be addressed.
    #[error("non-canonical paste array encoding")]
    NonCanonicalArray,
    /// A copy/paste index is smaller than one word.
    #[error("packed byte index {0} is below the 32-byte bias")]
    IndexBelowWord(u128),
    /// A copy/paste index does not fit a u32 offset.
    #[error("packed byte index {0} exceeds the addressable range")]
    OffsetTooLarge(u128),
    /// A call index does not fit a u32.
    #[error("call index {0} exceeds the addressable range")]
    CallIndexTooLarge(u128),
    /// A paste length outside `1..=65535`.
    #[error("invalid paste length {0}")]
    InvalidLength(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paste(source: PasteSource, from: u32, to: u32, len: u32) -> PasteInstruction {
        PasteInstruction::new(source, from, to, len).unwrap()
    }

    #[test]
    fn copy_single_matches_reference_layout() {
        // Return[0] word at byte 0 pasted over the first argument (byte 4).
        let clip = Clipboard::from_pastes(vec![PasteInstruction::word(PasteSource::Return(0), 0, 4)], None);
        let bytes = clip.encode();
        assert_eq!(bytes.len(), 34);
        assert_eq!(&bytes[..2], &[1, 0]);
        let word = &bytes[2..];
        assert_eq!(&word[..2], &[0, 0]);
        assert!(word[2..12].iter().all(|b| *b == 0));
        assert_eq!(word[21], 32);
        assert_eq!(word[31], 36);
    }

    #[test]
    fn publisher_sentinel_fills_source_field() {
        let word = PasteInstruction::word(PasteSource::Publisher, 12, 4).pack();
        assert!(word[2..12].iter().all(|b| *b == 0xff));
        let operator = PasteInstruction::word(PasteSource::Operator, 0, 4).pack();
        assert_eq!(operator[11], 0xfe);
    }

    #[test]
    fn multi_round_trip_with_value() {
        let clip = Clipboard::from_pastes(
            vec![
                paste(PasteSource::Return(3), 0, 4, 32),
                paste(PasteSource::Operator, 10, 40, 7),
            ],
            Some(U256::from(99u8)),
        );
        let bytes = clip.encode();
        assert_eq!(bytes.len(), 2 + 64 + 64 + 32);
        assert_eq!(Clipboard::decode(&bytes).unwrap(), clip);
    }

    #[test]
    fn empty_and_legacy_no_copy_decode_leniently() {
        assert_eq!(Clipboard::decode(&[]).unwrap(), Clipboard::default());
        assert_eq!(Clipboard::decode(&[0, 0, 0]).unwrap(), Clipboard::default());
        assert_eq!(Clipboard::default().encode().as_ref(), &[0, 0]);
    }

    #[test]
    fn rejects_bad_header_bytes() {
        assert_eq!(
            Clipboard::decode(&[3, 0]),
            Err(ClipboardError::InvalidClipboardType(3))
        );
        assert_eq!(
            Clipboard::decode(&[0, 2]),
            Err(ClipboardError::InvalidValueFlag(2))
        );
        assert_eq!(
            Clipboard::decode(&[0]),
            Err(ClipboardError::ClipboardLength { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn no_copy_with_value_requires_exact_length() {
        let mut bytes = Clipboard::value(U256::from(1u8)).encode().to_vec();
        bytes.push(0);
        assert_eq!(
            Clipboard::decode(&bytes),
            Err(ClipboardError::ClipboardLength { expected: 34, actual: 35 })
        );
    }

    #[test]
    fn index_below_bias_is_rejected() {
        let word = pack_word(32, 0, 31, 36);
        assert_eq!(
            PasteInstruction::unpack(&word),
            Err(ClipboardError::IndexBelowWord(31))
        );
    }

    #[test]
    fn non_canonical_array_offset_is_rejected() {
        let mut bytes = Clipboard::from_pastes(
            vec![
                PasteInstruction::word(PasteSource::Return(0), 0, 4),
                PasteInstruction::word(PasteSource::Return(0), 0, 36),
            ],
            None,
        )
        .encode()
        .to_vec();
        bytes[2 + 31] = 0x40;
        assert_eq!(Clipboard::decode(&bytes), Err(ClipboardError::NonCanonicalArray));
    }

    #[test]
    fn return_index_past_u64_saturates() {
        let word = pack_word(32, u128::from(u64::MAX) + 1, 32, 36);
        let paste = PasteInstruction::unpack(&word).unwrap();
        assert_eq!(paste.source(), PasteSource::Return(u64::MAX));
    }

    #[test]
    fn zero_length_paste_is_unconstructible() {
        assert_eq!(
            PasteInstruction::new(PasteSource::Publisher, 0, 0, 0),
            Err(ClipboardError::InvalidLength(0))
        );
    }
}
