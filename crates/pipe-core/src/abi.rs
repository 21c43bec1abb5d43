// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Word-level ABI helpers.
//!
//! Calldata is `selector(4) || word(32) * n`, with dynamic `bytes32[]`
//! arguments encoded as a head offset (relative to the first argument word)
//! pointing at `length || items`. Return data is a plain sequence of words.
//! This is the subset the composer's own targets speak; arbitrary targets may
//! use any byte format since the composer only sees opaque bytes.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

use crate::constants::{SELECTOR_LEN, WORD_LEN};
use crate::contract::Revert;

/// Four-byte function selector.
pub type Selector = [u8; 4];

/// Computes the selector for a canonical signature such as `"add(uint256,uint256)"`.
pub fn selector(signature: &str) -> Selector {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encodes `selector || args`.
pub fn encode_call(selector: Selector, args: &[B256]) -> Bytes {
    let mut out = Vec::with_capacity(SELECTOR_LEN + args.len() * WORD_LEN);
    out.extend_from_slice(&selector);
    for arg in args {
        out.extend_from_slice(arg.as_slice());
    }
    out.into()
}

/// Encodes a sequence of return words.
pub fn encode_words(words: &[B256]) -> Bytes {
    let mut out = Vec::with_capacity(words.len() * WORD_LEN);
    for word in words {
        out.extend_from_slice(word.as_slice());
    }
    out.into()
}

/// Encodes a static head followed by one trailing `bytes32[]` argument.
///
/// `head` are the static words preceding the array; the array's offset word
/// is appended automatically.
pub fn encode_call_with_array(selector: Selector, head: &[B256], array: &[B256]) -> Bytes {
    let mut args = head.to_vec();
    let offset = (head.len() + 1) * WORD_LEN;
    args.push(word_usize(offset));
    args.push(word_usize(array.len()));
    args.extend_from_slice(array);
    encode_call(selector, &args)
}

/// Big-endian word for a `U256`.
pub fn word_u256(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// Big-endian word for a `usize`.
pub fn word_usize(value: usize) -> B256 {
    word_u256(U256::from(value))
}

/// Left-padded word for an address.
pub fn word_address(address: Address) -> B256 {
    address.into_word()
}

/// `0` or `1` word for a boolean.
pub fn word_bool(value: bool) -> B256 {
    word_u256(U256::from(u8::from(value)))
}

/// Interprets a word as a big-endian `U256`.
pub fn word_to_u256(word: &B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// Converts a `U256` to `usize`, returning `None` when it does not fit.
pub fn u256_to_usize(value: U256) -> Option<usize> {
    let limbs = value.as_limbs();
    if limbs[1..].iter().any(|limb| *limb != 0) {
        return None;
    }
    usize::try_from(limbs[0]).ok()
}

/// Borrowed view over the argument words of a calldata buffer.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    words: &'a [u8],
}

impl<'a> Args<'a> {
    /// Splits calldata into its selector and arguments.
    ///
    /// # Errors
    /// Returns [`Revert::Malformed`] if the calldata is shorter than a selector.
    pub fn split(calldata: &'a [u8]) -> Result<(Selector, Self), Revert> {
        if calldata.len() < SELECTOR_LEN {
            return Err(Revert::Malformed("calldata shorter than a selector"));
        }
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(&calldata[..SELECTOR_LEN]);
        Ok((
            selector,
            Self {
                words: &calldata[SELECTOR_LEN..],
            },
        ))
    }

    /// Raw argument bytes (everything after the selector).
    pub fn raw(&self) -> &'a [u8] {
        self.words
    }

    fn at(&self, byte_offset: usize) -> Result<B256, Revert> {
        let end = byte_offset
            .checked_add(WORD_LEN)
            .ok_or(Revert::Malformed("argument offset overflow"))?;
        self.words
            .get(byte_offset..end)
            .map(B256::from_slice)
            .ok_or(Revert::Malformed("argument out of range"))
    }

    /// The `index`th static argument word.
    ///
    /// # Errors
    /// Returns [`Revert::Malformed`] if the word is missing.
    pub fn word(&self, index: usize) -> Result<B256, Revert> {
        let offset = index
            .checked_mul(WORD_LEN)
            .ok_or(Revert::Malformed("argument index overflow"))?;
        self.at(offset)
    }

    /// The `index`th argument as a `U256`.
    ///
    /// # Errors
    /// Returns [`Revert::Malformed`] if the word is missing.
    pub fn u256(&self, index: usize) -> Result<U256, Revert> {
        self.word(index).map(|w| word_to_u256(&w))
    }

    /// The `index`th argument as an address (low 20 bytes; high bytes must be zero).
    ///
    /// # Errors
    /// Returns [`Revert::Malformed`] if the word is missing or not a clean address.
    pub fn address(&self, index: usize) -> Result<Address, Revert> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(Revert::Malformed("dirty address word"));
        }
        Ok(Address::from_word(word))
    }

    /// The `index`th argument as a boolean (`0` or `1`).
    ///
    /// # Errors
    /// Returns [`Revert::Malformed`] if the word is missing or not `0`/`1`.
    pub fn bool(&self, index: usize) -> Result<bool, Revert> {
        let value = self.u256(index)?;
        if value == U256::ZERO {
            Ok(false)
        } else if value == U256::from(1u8) {
            Ok(true)
        } else {
            Err(Revert::Malformed("boolean word is neither 0 nor 1"))
        }
    }

    /// The `index`th argument as a dynamic `bytes32[]`.
    ///
    /// # Errors
    /// Returns [`Revert::Malformed`] if the offset, length, or items fall
    /// outside the calldata.
    pub fn word_array(&self, index: usize) -> Result<Vec<B256>, Revert> {
        let offset = u256_to_usize(self.u256(index)?)
            .ok_or(Revert::Malformed("array offset overflow"))?;
        let len = u256_to_usize(word_to_u256(&self.at(offset)?))
            .ok_or(Revert::Malformed("array length overflow"))?;
        let available = self.words.len().saturating_sub(offset + WORD_LEN) / WORD_LEN;
        if len > available {
            return Err(Revert::Malformed("array items out of range"));
        }
        (0..len)
            .map(|i| self.at(offset + WORD_LEN * (i + 1)))
            .collect()
    }
}
