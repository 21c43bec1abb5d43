// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blueprints and their canonical hash.
use alloy_primitives::Bytes;
use blake3::Hasher;

use super::operator_paste::{OperatorPasteInstr, OperatorPasteSource};
use crate::call::{Call, Target};
use crate::domain::BLUEPRINT_V1;
use crate::ident::BlueprintHash;

/// A reusable, signable batch template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blueprint {
    /// Calls executed in order.
    pub calls: Vec<Call>,
    /// Operator-time pastes applied to `calls` before execution.
    #[cfg_attr(feature = "serde", serde(default))]
    pub operator_pastes: Vec<OperatorPasteInstr>,
    /// Maximum successful executions; `None` for unlimited.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_uses: Option<u64>,
    /// Earliest timestamp (inclusive) at which the blueprint may run.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_time: Option<u64>,
    /// Latest timestamp (inclusive) at which the blueprint may run.
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_time: Option<u64>,
    /// Opaque publisher data bound into the hash.
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: Bytes,
}

impl Blueprint {
    /// A blueprint over `calls` with no operator pastes and unlimited uses.
    pub fn new(calls: Vec<Call>) -> Self {
        Self {
            calls,
            ..Self::default()
        }
    }

    /// Whether `now` falls inside the validity window.
    pub fn is_active(&self, now: u64) -> bool {
        self.start_time.is_none_or(|start| now >= start)
            && self.end_time.is_none_or(|end| now <= end)
    }

    /// Canonical hash; see [`hash_blueprint`].
    pub fn hash(&self) -> BlueprintHash {
        hash_blueprint(self)
    }
}

/// Computes the canonical, order-sensitive identity of `blueprint`.
///
/// Layout (all counts and lengths u64 little-endian):
/// `"pipe:blueprint:v1\0"`, call count, then per call a target tag
/// (`0` external, `1` internal, `2` static), the 20-byte target address
/// (zeros for internal), length-prefixed calldata and length-prefixed
/// clipboard; then the operator paste count and per paste a source tag
/// (`0` publisher, `1` operator, `2` operator data), the data offset (zero for
/// address sources), call index, destination offset and length as u32; then
/// a presence byte and value for each of `max_uses`, `start_time` and
/// `end_time`; then length-prefixed metadata.
pub fn hash_blueprint(blueprint: &Blueprint) -> BlueprintHash {
    let mut hasher = Hasher::new();
    hasher.update(BLUEPRINT_V1);
    hasher.update(&(blueprint.calls.len() as u64).to_le_bytes());
    for call in &blueprint.calls {
        let (tag, address) = match call.target {
            Target::External(address) => (0u8, address),
            Target::Internal => (1u8, alloy_primitives::Address::ZERO),
            Target::Static(address) => (2u8, address),
        };
        hasher.update(&[tag]);
        hasher.update(address.as_slice());
        update_prefixed(&mut hasher, &call.data);
        update_prefixed(&mut hasher, &call.clipboard);
    }
    hasher.update(&(blueprint.operator_pastes.len() as u64).to_le_bytes());
    for paste in &blueprint.operator_pastes {
        let (tag, offset) = match paste.source() {
            OperatorPasteSource::Publisher => (0u8, 0u32),
            OperatorPasteSource::Operator => (1, 0),
            OperatorPasteSource::OperatorData(offset) => (2, offset),
        };
        hasher.update(&[tag]);
        hasher.update(&offset.to_le_bytes());
        hasher.update(&paste.call_index().to_le_bytes());
        hasher.update(&paste.dest_offset().to_le_bytes());
        hasher.update(&paste.length().to_le_bytes());
    }
    update_optional(&mut hasher, blueprint.max_uses);
    update_optional(&mut hasher, blueprint.start_time);
    update_optional(&mut hasher, blueprint.end_time);
    update_prefixed(&mut hasher, &blueprint.metadata);
    BlueprintHash(hasher.finalize().into())
}

fn update_optional(hasher: &mut Hasher, value: Option<u64>) {
    match value {
        Some(value) => {
            hasher.update(&[1]);
            hasher.update(&value.to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

fn update_prefixed(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
