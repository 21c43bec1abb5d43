// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Requisition lifecycle: publish, use caps, cancellation, nonces.

mod common;

use common::{u, NOW};
use pipe_core::drafter::BlueprintDraft;
use pipe_core::{
    BlueprintRegistry, BlueprintStatus, Bytes, ExecutionError, Requisition, Target, VerifyError,
    B256,
};
use pipe_dry_tests::{operator, publisher_key, ComposerTestBuilder, Deployment, Probe};

fn poke_requisition(d: &Deployment, seed: u8, max_uses: Option<u64>) -> Requisition {
    let mut draft = BlueprintDraft::new().call(Target::External(d.probe), Probe::poke_call(u(1)));
    if let Some(max) = max_uses {
        draft = draft.max_uses(max);
    }
    Requisition::sign(draft.build().unwrap(), &publisher_key(seed))
}

#[test]
fn publish_records_fresh_status() {
    let d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 1, Some(3));
    let mut registry = BlueprintRegistry::new();

    let hash = registry.publish(&requisition).unwrap();

    assert_eq!(hash, requisition.blueprint_hash);
    let status = registry.status(requisition.publisher, hash).unwrap();
    assert_eq!(
        status,
        BlueprintStatus {
            uses: 0,
            max_uses: Some(3),
            cancelled: false,
        }
    );
    assert_eq!(status.remaining(), Some(3));
}

#[test]
fn unknown_blueprint_has_no_status_and_zero_nonce() {
    let d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 1, None);
    let registry = BlueprintRegistry::new();

    assert_eq!(
        registry.status(requisition.publisher, requisition.blueprint_hash),
        Err(ExecutionError::UnknownBlueprint(requisition.blueprint_hash))
    );
    assert_eq!(
        registry.nonce(requisition.publisher, requisition.blueprint_hash),
        0
    );
}

#[test]
fn publish_rejects_forged_requisition() {
    let d = ComposerTestBuilder::new().build();
    let mut requisition = poke_requisition(&d, 1, None);
    requisition.blueprint.metadata = Bytes::from_static(b"edited");
    let mut registry = BlueprintRegistry::new();

    assert_eq!(
        registry.publish(&requisition),
        Err(ExecutionError::InvalidSignature(VerifyError::HashMismatch))
    );
}

#[test]
fn use_cap_is_enforced_after_successful_runs() {
    let mut d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 2, Some(2));
    let mut registry = BlueprintRegistry::new();

    for _ in 0..2 {
        registry
            .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW)
            .unwrap();
    }
    let err = registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW)
        .unwrap_err();

    assert_eq!(
        err,
        ExecutionError::UsesExhausted {
            hash: requisition.blueprint_hash,
            uses: 2,
        }
    );
    let status = registry
        .status(requisition.publisher, requisition.blueprint_hash)
        .unwrap();
    assert_eq!(status.remaining(), Some(0));
}

#[test]
fn zero_use_cap_never_runs() {
    let mut d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 2, Some(0));
    let mut registry = BlueprintRegistry::new();

    let err = registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW)
        .unwrap_err();

    assert!(matches!(err, ExecutionError::UsesExhausted { uses: 0, .. }));
    assert_eq!(d.composer.ledger().load(d.probe, B256::ZERO), B256::ZERO);
}

#[test]
fn failed_run_consumes_no_use() {
    let mut d = ComposerTestBuilder::new().build();
    let blueprint = BlueprintDraft::new()
        .call(Target::External(d.reverter), Bytes::new())
        .max_uses(1)
        .build()
        .unwrap();
    let requisition = Requisition::sign(blueprint, &publisher_key(3));
    let mut registry = BlueprintRegistry::new();
    registry.publish(&requisition).unwrap();

    assert!(registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW)
        .is_err());

    let status = registry
        .status(requisition.publisher, requisition.blueprint_hash)
        .unwrap();
    assert_eq!(status.uses, 0);
    assert_eq!(status.remaining(), Some(1));
}

#[test]
fn cancelled_blueprint_is_refused() {
    let mut d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 4, None);
    let mut registry = BlueprintRegistry::new();
    registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW)
        .unwrap();

    registry.cancel(requisition.publisher, &requisition).unwrap();
    let err = registry
        .tractor(&mut d.composer, &requisition, operator("o2"), Bytes::new(), NOW)
        .unwrap_err();

    assert_eq!(
        err,
        ExecutionError::BlueprintCancelled(requisition.blueprint_hash)
    );
    assert_eq!(
        registry.nonce(requisition.publisher, requisition.blueprint_hash),
        1
    );
}

#[test]
fn only_the_publisher_may_cancel() {
    let d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 4, None);
    let mut registry = BlueprintRegistry::new();

    let err = registry.cancel(operator("o1"), &requisition).unwrap_err();

    assert_eq!(err, ExecutionError::InvalidSignature(VerifyError::NotPublisher));
    assert!(registry
        .status(requisition.publisher, requisition.blueprint_hash)
        .is_err());
}

#[test]
fn identical_blueprints_from_different_publishers_are_tracked_apart() {
    let mut d = ComposerTestBuilder::new().build();
    let first = poke_requisition(&d, 5, Some(1));
    let second = poke_requisition(&d, 6, Some(1));
    assert_eq!(first.blueprint_hash, second.blueprint_hash);
    let mut registry = BlueprintRegistry::new();

    registry.cancel(first.publisher, &first).unwrap();
    registry
        .tractor(&mut d.composer, &second, operator("o1"), Bytes::new(), NOW)
        .unwrap();

    assert!(registry.status(first.publisher, first.blueprint_hash).unwrap().cancelled);
    assert_eq!(registry.nonce(second.publisher, second.blueprint_hash), 1);
    assert_eq!(registry.nonce(first.publisher, first.blueprint_hash), 0);
}

#[test]
fn republishing_keeps_existing_status() {
    let mut d = ComposerTestBuilder::new().build();
    let requisition = poke_requisition(&d, 7, None);
    let mut registry = BlueprintRegistry::new();
    registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW)
        .unwrap();

    registry.publish(&requisition).unwrap();

    assert_eq!(
        registry.nonce(requisition.publisher, requisition.blueprint_hash),
        1
    );
}

#[test]
fn validity_window_gates_execution() {
    let mut d = ComposerTestBuilder::new().build();
    let blueprint = BlueprintDraft::new()
        .call(Target::External(d.probe), Probe::poke_call(u(1)))
        .active_between(NOW, NOW + 3_600)
        .build()
        .unwrap();
    let requisition = Requisition::sign(blueprint, &publisher_key(8));
    let hash = requisition.blueprint_hash;
    let mut registry = BlueprintRegistry::new();

    let early = registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW - 1)
        .unwrap_err();
    assert_eq!(early, ExecutionError::BlueprintNotActive { hash, now: NOW - 1 });
    assert_eq!(d.composer.ledger().load(d.probe, B256::ZERO), B256::ZERO);

    for now in [NOW, NOW + 3_600] {
        registry
            .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), now)
            .unwrap();
    }

    let late = registry
        .tractor(&mut d.composer, &requisition, operator("o1"), Bytes::new(), NOW + 3_601)
        .unwrap_err();
    assert_eq!(late, ExecutionError::BlueprintNotActive { hash, now: NOW + 3_601 });
    assert_eq!(registry.nonce(requisition.publisher, hash), 2);
}

#[test]
fn window_is_bound_into_the_signature() {
    let d = ComposerTestBuilder::new().build();
    let blueprint = BlueprintDraft::new()
        .call(Target::External(d.probe), Probe::poke_call(u(1)))
        .ends_at(NOW)
        .build()
        .unwrap();
    let mut requisition = Requisition::sign(blueprint, &publisher_key(8));
    requisition.blueprint.end_time = None;

    assert_eq!(
        BlueprintRegistry::new().publish(&requisition),
        Err(ExecutionError::InvalidSignature(VerifyError::HashMismatch))
    );
}
