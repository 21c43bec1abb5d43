// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for pipe tools.
//! Keeps storage adapters thin and independent of the composer.

pub mod config;
