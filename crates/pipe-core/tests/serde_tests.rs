// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![cfg(feature = "serde")]
#![allow(missing_docs)]
//! JSON forms of requisitions and composer config.

use pipe_core::drafter::{operator_address_paste, paste_publisher, BlueprintDraft};
use pipe_core::{
    make_address, BlueprintHash, Bytes, ComposerConfig, PasteInstruction, Requisition, Target,
    VerifyError, U256,
};
use pipe_dry_tests::{publisher_key, MockToken};

#[test]
fn requisition_survives_json_and_still_verifies() {
    let blueprint = BlueprintDraft::new()
        .call(
            Target::External(make_address("token")),
            MockToken::transfer_from_call(make_address("a"), make_address("b"), U256::from(5u8)),
        )
        .paste(paste_publisher(0))
        .operator_paste(operator_address_paste(0, 1))
        .max_uses(4)
        .metadata(Bytes::from_static(b"tip"))
        .build()
        .unwrap();
    let requisition = Requisition::sign(blueprint, &publisher_key(9));

    let json = serde_json::to_string(&requisition).unwrap();
    let back: Requisition = serde_json::from_str(&json).unwrap();

    assert_eq!(back, requisition);
    assert!(back.verify().is_ok());
}

#[test]
fn blueprint_hash_serializes_as_prefixed_hex() {
    let hash = BlueprintHash([0xab; 32]);
    let json = serde_json::to_string(&hash).unwrap();
    assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
    assert_eq!(serde_json::from_str::<BlueprintHash>(&json).unwrap(), hash);
}

#[test]
fn composer_config_fills_missing_fields() {
    let config: ComposerConfig = serde_json::from_str(r#"{"max_pastes_per_call": 2}"#).unwrap();
    assert_eq!(config.max_pastes_per_call, 2);
    assert_eq!(config.max_calls, ComposerConfig::default().max_calls);
}

fn tip_requisition() -> Requisition {
    let blueprint = BlueprintDraft::new()
        .call(
            Target::External(make_address("token")),
            MockToken::transfer_call(make_address("a"), U256::from(1u8)),
        )
        .operator_paste(operator_address_paste(0, 0))
        .build()
        .unwrap();
    Requisition::sign(blueprint, &publisher_key(9))
}

#[test]
fn operator_paste_length_is_validated_on_load() {
    let mut json = serde_json::to_value(tip_requisition()).unwrap();
    for bad in [0u32, 33, 70_000] {
        json["blueprint"]["operator_pastes"][0]["length"] = bad.into();
        assert!(
            serde_json::from_value::<Requisition>(json.clone()).is_err(),
            "length {bad}"
        );
    }
}

#[test]
fn edited_operator_paste_length_breaks_verification() {
    let mut json = serde_json::to_value(tip_requisition()).unwrap();
    json["blueprint"]["operator_pastes"][0]["length"] = 20.into();

    let edited: Requisition = serde_json::from_value(json).unwrap();

    assert_eq!(edited.verify(), Err(VerifyError::HashMismatch));
}

#[test]
fn paste_instruction_length_is_validated_on_load() {
    let json = |length: u32| {
        format!(r#"{{"source":{{"Return":0}},"source_offset":0,"dest_offset":4,"length":{length}}}"#)
    };
    assert!(serde_json::from_str::<PasteInstruction>(&json(0)).is_err());
    assert!(serde_json::from_str::<PasteInstruction>(&json(65_536)).is_err());
    let paste: PasteInstruction = serde_json::from_str(&json(32)).unwrap();
    assert_eq!(paste.length(), 32);
}
