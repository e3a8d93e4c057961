//! Property tests for the half-open overlap predicate.

use crate::logic::overlaps;
use chrono::{Duration, TimeZone, Utc};
use pollcal_common::services::Interval;
use proptest::prelude::*;

fn interval_from_offsets(start_secs: i64, len_secs: i64) -> Interval {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let start = base + Duration::seconds(start_secs);
    Interval::new(start, start + Duration::seconds(len_secs))
}

proptest! {
    #[test]
    fn overlap_is_symmetric(
        a_start in 0i64..1_000_000,
        a_len in 0i64..100_000,
        b_start in 0i64..1_000_000,
        b_len in 0i64..100_000,
    ) {
        let a = interval_from_offsets(a_start, a_len);
        let b = interval_from_offsets(b_start, b_len);
        prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
    }

    #[test]
    fn overlap_matches_nonempty_intersection(
        a_start in 0i64..1_000_000,
        a_len in 1i64..100_000,
        b_start in 0i64..1_000_000,
        b_len in 1i64..100_000,
    ) {
        let a = interval_from_offsets(a_start, a_len);
        let b = interval_from_offsets(b_start, b_len);
        let intersection_start = a.start.max(b.start);
        let intersection_end = a.end.min(b.end);
        prop_assert_eq!(overlaps(&a, &b), intersection_start < intersection_end);
    }

    #[test]
    fn adjacent_intervals_never_overlap(
        start in 0i64..1_000_000,
        first_len in 1i64..100_000,
        second_len in 1i64..100_000,
    ) {
        let first = interval_from_offsets(start, first_len);
        let second = interval_from_offsets(start + first_len, second_len);
        prop_assert!(!overlaps(&first, &second));
    }

    #[test]
    fn empty_interval_overlaps_iff_strictly_inside(
        point in 0i64..1_000_000,
        b_start in 0i64..1_000_000,
        b_len in 0i64..100_000,
    ) {
        let empty = interval_from_offsets(point, 0);
        let other = interval_from_offsets(b_start, b_len);
        let strictly_inside = b_start < point && point < b_start + b_len;
        prop_assert_eq!(overlaps(&empty, &other), strictly_inside);
    }
}
