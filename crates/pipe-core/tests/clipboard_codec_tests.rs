// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Wire-level clipboard checks: pinned-seed round trip plus malformed inputs.

use pipe_core::{
    Clipboard, ClipboardError, ClipboardType, PasteInstruction, PasteSource, OPERATOR_SENTINEL,
    PUBLISHER_SENTINEL, U256,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

const SEED_BYTES: [u8; 32] = [
    0x50, 0x49, 0x50, 0x45, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0,
];

fn source_strategy() -> impl Strategy<Value = PasteSource> {
    prop_oneof![
        (0u64..1_000).prop_map(PasteSource::Return),
        Just(PasteSource::Publisher),
        Just(PasteSource::Operator),
    ]
}

fn paste_strategy() -> impl Strategy<Value = PasteInstruction> {
    (source_strategy(), 0u32..4_096, 0u32..4_096, 1u32..=65_535).prop_map(
        |(source, from, to, length)| {
            PasteInstruction::new(source, from, to, length)
                .unwrap_or_else(|_| PasteInstruction::word(source, from, to))
        },
    )
}

fn value_strategy() -> impl Strategy<Value = Option<U256>> {
    prop_oneof![
        Just(None),
        any::<u128>().prop_map(|v| Some(U256::from(v))),
        Just(Some(U256::MAX)),
    ]
}

#[test]
fn clipboard_round_trips_with_pinned_seed() {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);
    let strategy = (prop::collection::vec(paste_strategy(), 0..6), value_strategy());

    runner
        .run(&strategy, |(pastes, value)| {
            let clipboard = Clipboard::from_pastes(pastes.clone(), value);
            let wire = clipboard.encode();
            let decoded = Clipboard::decode(&wire).expect("decode canonical clipboard");
            prop_assert_eq!(decoded.pastes(), &pastes[..]);
            prop_assert_eq!(decoded.attached_value(), value);
            prop_assert_eq!(decoded.encode(), wire);
            Ok(())
        })
        .expect("clipboard round trip");
}

#[test]
fn packed_word_layout_is_fixed() {
    let paste = PasteInstruction::new(PasteSource::Return(2), 64, 36, 20).unwrap();
    let word = paste.pack();
    assert_eq!(&word[0..2], &[0, 20]);
    // Return index is raw; byte indices are offsets plus 32.
    assert_eq!(word[11], 2);
    assert_eq!(word[21], 64 + 32);
    assert_eq!(word[31], 36 + 32);
}

#[test]
fn full_word_length_is_encoded_as_zero() {
    let word = PasteInstruction::word(PasteSource::Return(0), 0, 4).pack();
    assert_eq!(&word[0..2], &[0, 0]);
    assert_eq!(PasteInstruction::unpack(&word).unwrap().length(), 32);
}

#[test]
fn sentinels_select_publisher_and_operator() {
    for (source, sentinel) in [
        (PasteSource::Publisher, PUBLISHER_SENTINEL),
        (PasteSource::Operator, OPERATOR_SENTINEL),
    ] {
        let word = PasteInstruction::word(source, 0, 4).pack();
        let mut expected = [0u8; 16];
        expected[6..].copy_from_slice(&word[2..12]);
        assert_eq!(u128::from_be_bytes(expected), sentinel);
        assert_eq!(PasteInstruction::unpack(&word).unwrap().source(), source);
    }
}

#[test]
fn empty_clipboard_is_no_copy() {
    let clipboard = Clipboard::decode(&[]).unwrap();
    assert_eq!(clipboard.kind(), ClipboardType::NoCopy);
    assert_eq!(clipboard.attached_value(), None);
}

#[test]
fn value_only_clipboard_carries_value() {
    let wire = Clipboard::value(U256::from(7u8)).encode();
    assert_eq!(wire.len(), 2 + 32);
    assert_eq!(&wire[..2], &[0, 1]);
    assert_eq!(
        Clipboard::decode(&wire).unwrap().attached_value(),
        Some(U256::from(7u8))
    );
}

#[test]
fn unknown_type_byte_is_rejected() {
    assert_eq!(
        Clipboard::decode(&[3, 0]),
        Err(ClipboardError::InvalidClipboardType(3))
    );
}

#[test]
fn value_flag_must_be_binary() {
    assert_eq!(
        Clipboard::decode(&[0, 2]),
        Err(ClipboardError::InvalidValueFlag(2))
    );
}

#[test]
fn truncated_single_paste_is_rejected() {
    let wire = Clipboard::from_pastes(vec![PasteInstruction::word(PasteSource::Return(0), 0, 4)], None)
        .encode();
    assert!(matches!(
        Clipboard::decode(&wire[..wire.len() - 1]),
        Err(ClipboardError::ClipboardLength { .. })
    ));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut wire = Clipboard::value(U256::from(1u8)).encode().to_vec();
    wire.push(0);
    assert!(matches!(
        Clipboard::decode(&wire),
        Err(ClipboardError::ClipboardLength { .. })
    ));
}

#[test]
fn multi_copy_requires_canonical_array_offset() {
    let pastes = vec![
        PasteInstruction::word(PasteSource::Return(0), 0, 4),
        PasteInstruction::word(PasteSource::Return(1), 0, 36),
    ];
    let mut wire = Clipboard::from_pastes(pastes, None).encode().to_vec();
    wire[2 + 31] = 0x40;
    assert_eq!(
        Clipboard::decode(&wire),
        Err(ClipboardError::NonCanonicalArray)
    );
}

#[test]
fn zero_length_paste_cannot_be_built() {
    assert_eq!(
        PasteInstruction::new(PasteSource::Return(0), 0, 4, 0),
        Err(ClipboardError::InvalidLength(0))
    );
}
