// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic keys, accounts, and a pre-wired composer.

use alloy_primitives::Address;
use pipe_core::{make_address, Composer, ComposerConfig, Junction, PublisherKey};

use crate::balances::register_internal_balances;
use crate::probe::{Probe, Reverter};
use crate::token::MockToken;

/// Publisher key derived from a one-byte seed.
pub fn publisher_key(seed: u8) -> PublisherKey {
    PublisherKey::from_seed(&[seed; 32])
}

/// Operator account for `label`.
pub fn operator(label: &str) -> Address {
    make_address(&format!("operator:{label}"))
}

/// A composer with the standard test contracts deployed.
#[derive(Debug)]
pub struct Deployment {
    /// The composer.
    pub composer: Composer,
    /// [`Junction`] address.
    pub junction: Address,
    /// [`MockToken`] address.
    pub token: Address,
    /// [`Probe`] address.
    pub probe: Address,
    /// [`Reverter`] address.
    pub reverter: Address,
}

/// Builder for [`Deployment`].
///
/// # Example
///
/// ```
/// use pipe_dry_tests::ComposerTestBuilder;
///
/// let deployment = ComposerTestBuilder::new().build();
/// assert!(deployment.composer.is_deployed(deployment.junction));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComposerTestBuilder {
    config: Option<ComposerConfig>,
    internal_balances: bool,
}

impl ComposerTestBuilder {
    /// Default limits, no internal balance functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the composer limits.
    pub fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers the internal balance functions.
    pub fn with_internal_balances(mut self) -> Self {
        self.internal_balances = true;
        self
    }

    /// Deploys everything.
    ///
    /// # Panics
    /// Only if the fixed fixture addresses collide, which they do not.
    #[allow(clippy::expect_used, reason = "fixture addresses are fixed and distinct")]
    pub fn build(self) -> Deployment {
        let mut composer = Composer::with_config(
            make_address("composer"),
            self.config.unwrap_or_default(),
        );
        let junction = make_address("junction");
        let token = make_address("token");
        let probe = make_address("probe");
        let reverter = make_address("reverter");
        composer.deploy(junction, Junction).expect("deploy junction");
        composer.deploy(token, MockToken).expect("deploy token");
        composer.deploy(probe, Probe).expect("deploy probe");
        composer.deploy(reverter, Reverter).expect("deploy reverter");
        if self.internal_balances {
            register_internal_balances(&mut composer).expect("register internal balances");
        }
        Deployment {
            composer,
            junction,
            token,
            probe,
            reverter,
        }
    }
}
