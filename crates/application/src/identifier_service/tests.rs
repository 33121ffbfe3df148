use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use interlock_core::Cancellation;
use interlock_domain::{Identifier, IdentifierKind};

use crate::data_options::IdentifierStrategy;
use crate::test_support::{BrokenClock, FixedClock};

use super::generators::comb_guid;
use super::{
    CombGuidGenerator, IdentifierGenerator, IncrementalLongGenerator, StoreIdentifier,
    StringTokenGenerator, build_identifier_generator,
};

#[tokio::test]
async fn comb_guids_are_distinct_across_one_hundred_thousand_draws() {
    let generator = CombGuidGenerator::new();
    let clock = FixedClock::epoch_plus_seconds(0);
    let cancellation = Cancellation::new();
    let mut seen = HashSet::with_capacity(100_000);

    for _ in 0..100_000 {
        let id = generator.generate(&clock, &cancellation).await;
        assert!(matches!(&id, Ok(Identifier::Guid(_))));
        if let Ok(id) = id {
            assert!(seen.insert(id));
        }
    }

    assert_eq!(seen.len(), 100_000);
}

#[tokio::test]
async fn comb_guids_sort_by_clock_time() {
    let generator = CombGuidGenerator::new();
    let clock = FixedClock::epoch_plus_seconds(0);
    let cancellation = Cancellation::new();

    let mut generated = Vec::new();
    for _ in 0..20 {
        match generator.generate(&clock, &cancellation).await {
            Ok(id) => generated.push(id),
            Err(error) => panic!("unexpected error: {error}"),
        }
        clock.advance(Duration::milliseconds(1));
    }

    let mut sorted = generated.clone();
    sorted.sort();
    assert_eq!(generated, sorted);
}

#[tokio::test]
async fn comb_guid_timestamp_never_moves_backwards() {
    let generator = CombGuidGenerator::new();
    let clock = FixedClock::epoch_plus_seconds(10);
    let cancellation = Cancellation::new();

    let first = generator.generate(&clock, &cancellation).await;
    clock.advance(Duration::seconds(-5));
    let second = generator.generate(&clock, &cancellation).await;

    let prefix = |id: &Identifier| id.as_guid().map(|guid| guid.as_bytes()[..6].to_vec());
    match (first, second) {
        (Ok(first), Ok(second)) => assert!(prefix(&second) >= prefix(&first)),
        _ => panic!("generation failed"),
    }
}

#[test]
fn comb_guid_layout_sets_version_and_variant() {
    let guid = comb_guid(0x0102_0304_0506, [0xFF; 10]);
    let bytes = guid.as_bytes();

    assert_eq!(&bytes[..6], &[1, 2, 3, 4, 5, 6]);
    assert_eq!(guid.get_version_num(), 7);
    assert_eq!(bytes[8] & 0xC0, 0x80);
}

#[tokio::test]
async fn cancelled_generation_produces_no_identifier() {
    let cancellation = Cancellation::new();
    cancellation.cancel();
    let clock = FixedClock::epoch_plus_seconds(0);

    for strategy in [
        IdentifierStrategy::CombGuid,
        IdentifierStrategy::IncrementalLong,
        IdentifierStrategy::StringToken,
    ] {
        let generator = build_identifier_generator(strategy);
        let result = generator.generate(&clock, &cancellation).await;
        assert!(matches!(result, Err(error) if error.is_cancelled()));
    }
}

#[tokio::test]
async fn clock_failure_propagates() {
    let generator = StringTokenGenerator::new();
    let result = generator.generate(&BrokenClock, &Cancellation::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn incremental_longs_start_at_seed_and_increase() {
    let generator = IncrementalLongGenerator::starting_at(41);
    let clock = FixedClock::epoch_plus_seconds(0);
    let cancellation = Cancellation::new();

    let first = generator.generate(&clock, &cancellation).await;
    let second = generator.generate(&clock, &cancellation).await;

    assert_eq!(first.ok(), Some(Identifier::from_long(41)));
    assert_eq!(second.ok(), Some(Identifier::from_long(42)));
}

#[tokio::test]
async fn last_issued_long_is_one_below_max() {
    let generator = IncrementalLongGenerator::starting_at(i64::MAX - 1);
    let clock = FixedClock::epoch_plus_seconds(0);
    let cancellation = Cancellation::new();

    let last = generator.generate(&clock, &cancellation).await;
    let exhausted = generator.generate(&clock, &cancellation).await;

    assert_eq!(last.ok(), Some(Identifier::from_long(i64::MAX - 1)));
    assert!(exhausted.is_err());
}

#[tokio::test]
async fn exhausted_sequence_is_an_error() {
    let generator = IncrementalLongGenerator::starting_at(i64::MAX);
    let result = generator
        .generate(&FixedClock::epoch_plus_seconds(0), &Cancellation::new())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn string_tokens_parse_back_as_guids() {
    let generator = StringTokenGenerator::new();
    let token = generator
        .generate(&FixedClock::epoch_plus_seconds(0), &Cancellation::new())
        .await;

    match token {
        Ok(Identifier::Text(text)) => {
            assert_eq!(text.len(), 36);
            assert!(Identifier::try_parse_as(IdentifierKind::Guid, &text).is_some());
        }
        other => panic!("unexpected token: {other:?}"),
    }
}

#[tokio::test]
async fn store_identifier_uses_configured_generator() {
    let store_identifier = StoreIdentifier::new(
        build_identifier_generator(IdentifierStrategy::IncrementalLong),
        Arc::new(FixedClock::epoch_plus_seconds(0)),
    );
    let cancellation = Cancellation::new();

    let audit = store_identifier.audit_id(&cancellation).await;
    let property = store_identifier.audit_property_id(&cancellation).await;
    let tenant = store_identifier.tenant_id(&cancellation).await;

    assert_eq!(store_identifier.kind(), IdentifierKind::Long);
    assert_eq!(audit.ok(), Some(Identifier::from_long(1)));
    assert_eq!(property.ok(), Some(Identifier::from_long(2)));
    assert_eq!(tenant.ok(), Some(Identifier::from_long(3)));
}
