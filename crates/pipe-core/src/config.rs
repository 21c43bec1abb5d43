// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Composer limits.

/// Config key under which tools persist a [`ComposerConfig`].
pub const COMPOSER_CONFIG_KEY: &str = "composer";

/// Resource limits enforced before any step of a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ComposerConfig {
    /// Maximum calls per batch.
    pub max_calls: usize,
    /// Maximum pastes per call clipboard.
    pub max_pastes_per_call: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_calls: 256,
            max_pastes_per_call: 64,
        }
    }
}
