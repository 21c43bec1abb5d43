// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain separation prefixes for hashing.

/// Prefix for blueprint hashes (the message publishers sign).
pub const BLUEPRINT_V1: &[u8] = b"pipe:blueprint:v1\0";

/// Prefix for ledger state digests.
pub const LEDGER_STATE_V1: &[u8] = b"pipe:ledger_state:v1\0";
