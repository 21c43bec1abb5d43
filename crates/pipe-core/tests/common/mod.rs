// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use pipe_core::abi::word_to_u256;
use pipe_core::{make_address, Bytes, CounterStore, B256, U256};
use pipe_dry_tests::{ComposerTestBuilder, Deployment};

/// Timestamp handed to the registry when a test does not care about windows.
pub const NOW: u64 = 1_700_000_000;

/// Shorthand for small `U256` literals.
pub fn u(value: u64) -> U256 {
    U256::from(value)
}

/// Word `n` of `data` as a `U256`.
///
/// # Panics
/// If `data` is shorter than `32 * (n + 1)` bytes.
pub fn word_at(data: &Bytes, n: usize) -> U256 {
    word_to_u256(&B256::from_slice(&data[32 * n..32 * (n + 1)]))
}

/// Raw word `n` of `data`.
pub fn raw_word_at(data: &[u8], n: usize) -> B256 {
    B256::from_slice(&data[32 * n..32 * (n + 1)])
}

/// Standard deployment plus an empty counter store.
pub fn setup() -> (Deployment, CounterStore) {
    (ComposerTestBuilder::new().build(), CounterStore::new())
}

/// Named end-user account.
pub fn account(label: &str) -> pipe_core::Address {
    make_address(&format!("user:{label}"))
}
