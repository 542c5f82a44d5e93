// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for all inputs,
//! helping catch edge cases that unit tests might miss.

use chrono::{DateTime, Duration, NaiveDateTime};
use proptest::prelude::*;
use syndication_engine::engine::snapshot::destination_publish_time;
use syndication_engine::OriginRef;

fn local_time(secs: i64) -> NaiveDateTime {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

// Real-world UTC offsets span -12:00 to +14:00.
const OFFSET_RANGE: std::ops::RangeInclusive<i32> = -720..=840;

// Seconds from 1970 through 2099.
const TIME_RANGE: std::ops::Range<i64> = 0..4_102_444_800i64;

// =============================================================================
// Publish-time shifting properties
// =============================================================================

proptest! {
    /// Equal offsets leave the local publish time untouched.
    #[test]
    fn same_offset_is_identity(secs in TIME_RANGE, offset in OFFSET_RANGE) {
        let source = local_time(secs);
        prop_assert_eq!(destination_publish_time(source, offset, offset), source);
    }

    /// Only the offset difference matters, not the absolute offsets.
    #[test]
    fn shift_depends_only_on_the_difference(
        secs in TIME_RANGE,
        origin in OFFSET_RANGE,
        dest in OFFSET_RANGE,
        delta in -120i32..=120i32,
    ) {
        let source = local_time(secs);
        prop_assert_eq!(
            destination_publish_time(source, origin, dest),
            destination_publish_time(source, origin + delta, dest + delta),
        );
    }

    /// Shifting to the destination zone and back recovers the source time.
    #[test]
    fn shift_is_invertible(
        secs in TIME_RANGE,
        origin in OFFSET_RANGE,
        dest in OFFSET_RANGE,
    ) {
        let source = local_time(secs);
        let shifted = destination_publish_time(source, origin, dest);
        prop_assert_eq!(destination_publish_time(shifted, dest, origin), source);
    }

    /// The shift magnitude is exactly the offset difference in minutes.
    #[test]
    fn shift_magnitude_matches_offset_difference(
        secs in TIME_RANGE,
        origin in OFFSET_RANGE,
        dest in OFFSET_RANGE,
    ) {
        let source = local_time(secs);
        let shifted = destination_publish_time(source, origin, dest);
        let expected = source - Duration::minutes(i64::from(origin - dest));
        prop_assert_eq!(shifted, expected);
    }
}

// =============================================================================
// Origin back-reference codec properties
// =============================================================================

proptest! {
    /// Origin references survive a JSON round trip for every id pair.
    #[test]
    fn origin_ref_json_round_trips(site in 1u64..u64::MAX, item in 1u64..u64::MAX) {
        let origin = OriginRef { site, item };
        let value = serde_json::to_value(origin).unwrap();
        let back: OriginRef = serde_json::from_value(value).unwrap();
        prop_assert_eq!(back, origin);
    }
}
