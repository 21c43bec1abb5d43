// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire constants shared by the clipboard codec, ABI helpers, and drafter.

/// Size of one ABI word in bytes.
pub const WORD_LEN: usize = 32;

/// Size of a function selector in bytes.
pub const SELECTOR_LEN: usize = 4;

/// Largest value representable in an 80-bit packed field.
pub const U80_MAX: u128 = (1u128 << 80) - 1;

/// Source/copy index sentinel meaning "the publisher's address".
pub const PUBLISHER_SENTINEL: u128 = U80_MAX;

/// Source/copy index sentinel meaning "the operator" (see the clipboard and
/// operator-paste docs for what each layer resolves it to).
pub const OPERATOR_SENTINEL: u128 = U80_MAX - 1;

/// Packed byte indices are memory-style: the wire value is the byte offset
/// plus one word (the end of the first copied word in a length-prefixed
/// buffer).
pub const INDEX_BIAS: u128 = WORD_LEN as u128;
