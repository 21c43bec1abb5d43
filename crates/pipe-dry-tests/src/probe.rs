// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Contracts that expose what the composer did to them.

use alloy_primitives::{Bytes, B256, U256};
use pipe_core::abi::{encode_call, encode_words, selector, word_address, word_u256, Args};
use pipe_core::{Contract, Frame, Revert};

/// Storage probe.
///
/// - `poke(uint256)` stores the word in slot 0 and returns the previous word.
/// - `peek()` returns slot 0.
/// - `echo(...)` returns its argument bytes verbatim.
/// - `whoami()` returns the caller and attached value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Probe;

impl Probe {
    /// `poke(uint256)` calldata.
    pub fn poke_call(value: U256) -> Bytes {
        encode_call(selector("poke(uint256)"), &[word_u256(value)])
    }

    /// `peek()` calldata.
    pub fn peek_call() -> Bytes {
        encode_call(selector("peek()"), &[])
    }

    /// `echo(bytes32[n])` calldata carrying `words`.
    pub fn echo_call(words: &[B256]) -> Bytes {
        encode_call(selector("echo()"), words)
    }

    /// `whoami()` calldata.
    pub fn whoami_call() -> Bytes {
        encode_call(selector("whoami()"), &[])
    }
}

impl Contract for Probe {
    fn call(&self, frame: &mut Frame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
        let (sel, args) = Args::split(data)?;
        if sel == selector("poke(uint256)") {
            let previous = frame.load(B256::ZERO);
            frame.store(B256::ZERO, args.word(0)?);
            Ok(encode_words(&[previous]))
        } else if sel == selector("peek()") {
            Ok(encode_words(&[frame.load(B256::ZERO)]))
        } else if sel == selector("echo()") {
            Ok(Bytes::copy_from_slice(args.raw()))
        } else if sel == selector("whoami()") {
            Ok(encode_words(&[word_address(frame.caller()), word_u256(frame.value())]))
        } else {
            Err(Revert::UnknownSelector(sel))
        }
    }
}

/// Reverts on every call after writing to its own storage, so tests can check
/// that the write does not survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverter;

impl Contract for Reverter {
    fn call(&self, frame: &mut Frame<'_>, _data: &[u8]) -> Result<Bytes, Revert> {
        frame.store(B256::ZERO, B256::with_last_byte(1));
        Err(Revert::Reason("reverter: always reverts".into()))
    }
}
