//! Unit tests for interval overlap and busy classification.

use crate::error::ErrorCode;
use crate::logic::{classify_provider_error, overlaps, slot_is_busy, Slot};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pollcal_common::services::{CalendarSchedule, FreeBusySchedule, Interval, ProviderError};

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, min, 0).unwrap()
}

fn interval(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Interval {
    Interval::new(at(start_h, start_m), at(end_h, end_m))
}

fn schedule_with(busy: Vec<Interval>, tentative: Vec<Interval>) -> FreeBusySchedule {
    let mut schedule = FreeBusySchedule::default();
    schedule
        .calendars
        .insert("work".to_string(), CalendarSchedule { busy, tentative });
    schedule
}

#[test]
fn test_overlap_partial() {
    // Busy 10:00-11:00 vs slot 10:30-11:30.
    assert!(overlaps(&interval(10, 0, 11, 0), &interval(10, 30, 11, 30)));
}

#[test]
fn test_overlap_containment() {
    // Busy 9:00-17:00 swallows slot 12:00-13:00, and vice versa.
    assert!(overlaps(&interval(9, 0, 17, 0), &interval(12, 0, 13, 0)));
    assert!(overlaps(&interval(12, 0, 13, 0), &interval(9, 0, 17, 0)));
}

#[test]
fn test_overlap_identical() {
    assert!(overlaps(&interval(10, 0, 11, 0), &interval(10, 0, 11, 0)));
}

#[test]
fn test_back_to_back_is_free() {
    // A meeting ending at 11:00 does not collide with a slot starting then.
    assert!(!overlaps(&interval(10, 0, 11, 0), &interval(11, 0, 12, 0)));
    assert!(!overlaps(&interval(11, 0, 12, 0), &interval(10, 0, 11, 0)));
}

#[test]
fn test_disjoint_intervals() {
    assert!(!overlaps(&interval(8, 0, 9, 0), &interval(14, 0, 15, 0)));
}

#[test]
fn test_zero_length_interval_overlaps_only_strictly_inside() {
    // An empty interval strictly inside a busy one still collides under the
    // half-open rule: s1 < e2 and s2 < e1 both hold.
    assert!(overlaps(&interval(10, 0, 10, 0), &interval(9, 0, 11, 0)));

    // Sitting exactly on either boundary does not.
    assert!(!overlaps(&interval(9, 0, 9, 0), &interval(9, 0, 11, 0)));
    assert!(!overlaps(&interval(11, 0, 11, 0), &interval(9, 0, 11, 0)));

    // Two empty intervals never collide, even at the same instant.
    assert!(!overlaps(&interval(10, 0, 10, 0), &interval(10, 0, 10, 0)));
}

#[test]
fn test_slot_busy_against_any_calendar() {
    let mut schedule = schedule_with(vec![], vec![]);
    schedule.calendars.insert(
        "personal".to_string(),
        CalendarSchedule {
            busy: vec![interval(10, 0, 11, 0)],
            tentative: vec![],
        },
    );

    let slot = Slot::new("slot-1", at(10, 30), at(11, 30));
    assert!(slot_is_busy(&slot, &schedule, true));
}

#[test]
fn test_slot_free_when_no_interval_overlaps() {
    let schedule = schedule_with(vec![interval(8, 0, 9, 0)], vec![]);
    let slot = Slot::new("slot-1", at(9, 0), at(10, 0));
    assert!(!slot_is_busy(&slot, &schedule, true));
}

#[test]
fn test_tentative_counts_when_flag_set() {
    let schedule = schedule_with(vec![], vec![interval(10, 0, 11, 0)]);
    let slot = Slot::new("slot-1", at(10, 30), at(11, 30));

    assert!(slot_is_busy(&slot, &schedule, true));
    assert!(!slot_is_busy(&slot, &schedule, false));
}

#[test]
fn test_confirmed_busy_ignores_tentative_flag() {
    let schedule = schedule_with(vec![interval(10, 0, 11, 0)], vec![]);
    let slot = Slot::new("slot-1", at(10, 30), at(11, 30));

    assert!(slot_is_busy(&slot, &schedule, false));
}

#[test]
fn test_empty_schedule_is_free() {
    let slot = Slot::new("slot-1", at(10, 0), at(11, 0));
    assert!(!slot_is_busy(&slot, &FreeBusySchedule::default(), true));
}

#[test]
fn test_classify_401_as_token_refresh_failed() {
    let err = classify_provider_error(ProviderError::Status {
        status: 401,
        message: "Invalid Credentials".to_string(),
    });
    assert_eq!(err.code, ErrorCode::TokenRefreshFailed);
}

#[test]
fn test_classify_403_as_insufficient_permissions() {
    let err = classify_provider_error(ProviderError::Status {
        status: 403,
        message: "Forbidden".to_string(),
    });
    assert_eq!(err.code, ErrorCode::InsufficientPermissions);
}

#[test]
fn test_classify_429_as_rate_limited() {
    let err = classify_provider_error(ProviderError::Status {
        status: 429,
        message: "Too Many Requests".to_string(),
    });
    assert_eq!(err.code, ErrorCode::RateLimited);
}

#[test]
fn test_classify_500_and_malformed_and_transport_as_api_error() {
    for err in [
        ProviderError::Status {
            status: 500,
            message: "boom".to_string(),
        },
        ProviderError::Malformed("missing field `calendars`".to_string()),
        ProviderError::Transport("connection reset".to_string()),
    ] {
        assert_eq!(classify_provider_error(err).code, ErrorCode::ApiError);
    }
}

#[test]
fn test_error_code_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorCode::TokenRefreshFailed).unwrap();
    assert_eq!(json, "\"token_refresh_failed\"");
    assert_eq!(ErrorCode::NotConnected.as_str(), "not_connected");
}

#[test]
fn test_slot_spanning_midnight() {
    let start = Utc.with_ymd_and_hms(2026, 3, 14, 23, 30, 0).unwrap();
    let end = start + Duration::hours(1);
    let slot = Slot::new("late", start, end);

    let schedule = schedule_with(
        vec![Interval::new(
            start + Duration::minutes(45),
            end + Duration::hours(1),
        )],
        vec![],
    );
    assert!(slot_is_busy(&slot, &schedule, false));
}
