// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! pipe-core: atomic call composition and signed blueprint execution.
//!
//! A [`Composer`] runs an ordered batch of [`Call`]s as one atomic unit. Each
//! call may carry a clipboard that pastes bytes from earlier return data, the
//! active publisher's address, or operator-supplied data into its calldata
//! before dispatch. Publishers sign [`Blueprint`]s once; operators submit the
//! resulting [`Requisition`]s any number of times, bounded by counters the
//! blueprint itself maintains.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cast_possible_truncation
)]
// Word-sized offsets are u32 on the wire and usize in memory; the casts above
// are bounded by the codec.

/// Word-level ABI helpers (selectors, argument words).
pub mod abi;
mod call;
/// Clipboard wire codec.
pub mod clipboard;
mod composer;
mod config;
mod constants;
mod context;
mod contract;
mod counter;
mod domain;
/// Blueprint authoring helpers.
pub mod drafter;
mod error;
mod gateway;
mod ident;
mod internal;
mod journal;
/// Arithmetic, comparison, and assertion contract.
pub mod junction;
mod ledger;
mod return_buffer;
/// Signed blueprint execution.
pub mod tractor;

pub use call::{Call, Target};
pub use clipboard::{Clipboard, ClipboardError, ClipboardType, PasteInstruction, PasteSource};
pub use composer::{Composer, ComposerError};
pub use config::{ComposerConfig, COMPOSER_CONFIG_KEY};
pub use constants::{
    INDEX_BIAS, OPERATOR_SENTINEL, PUBLISHER_SENTINEL, SELECTOR_LEN, U80_MAX, WORD_LEN,
};
pub use context::ExecutionContext;
pub use contract::{mapping_slot, Contract, Frame, Revert};
pub use counter::{CounterStore, CounterUpdate, COUNTER_FUNCTIONS};
pub use domain::{BLUEPRINT_V1, LEDGER_STATE_V1};
pub use error::{ExecutionError, StepError};
pub use ident::{address_from_public_key, make_address, make_counter_id, BlueprintHash, Hash};
pub use internal::{InternalFn, InternalFrame, InternalFunction};
pub use junction::Junction;
pub use ledger::Ledger;
pub use return_buffer::ReturnBuffer;
pub use tractor::{
    execute, hash_blueprint, Blueprint, BlueprintRegistry, BlueprintStatus, PublisherKey,
    Requisition, Signature, VerifyError,
};

/// Primitive types used throughout the public API.
pub use alloy_primitives::{Address, Bytes, B256, U256};
