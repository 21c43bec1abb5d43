// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for pipe crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`token`] - Minimal fungible token contract with calldata helpers
//! - [`probe`] - Storage probe and always-reverting contracts
//! - [`balances`] - Internal (composer-hosted) balance functions
//! - [`fixtures`] - Deterministic keys, addresses, and a composer builder

pub mod balances;
pub mod config;
pub mod fixtures;
pub mod probe;
pub mod token;

// Re-export commonly used items at crate root for convenience
pub use balances::{
    credit_internal, get_internal_balance_call, internal_balance, register_internal_balances,
    transfer_internal_call,
};
pub use config::InMemoryConfigStore;
pub use fixtures::{operator, publisher_key, ComposerTestBuilder, Deployment};
pub use probe::{Probe, Reverter};
pub use token::MockToken;
