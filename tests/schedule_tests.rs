use chrono::{NaiveDate, NaiveDateTime};
use grade_portal::{
    Decision,
    access::{
        CLOSED_ACCESS_PATH, FailingScheduleStore, MemoryScheduleStore, ScheduleGate,
        ScheduleStore, WindowLookup, schedule::window_bounds, schedule_key,
    },
    models::AccessWindow,
};
use std::sync::Arc;

// --- Helper Functions ---

const GROUP: &str = "bsc-cs-2";

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_hms_opt(hour, minute, 0).unwrap()
}

fn window(start: &str, end: &str) -> AccessWindow {
    AccessWindow {
        access_date: "2026-10-19".to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

fn gate_with(store: MemoryScheduleStore) -> ScheduleGate {
    ScheduleGate::new(Arc::new(store), CLOSED_ACCESS_PATH)
}

fn closed() -> Decision {
    Decision::Redirect(CLOSED_ACCESS_PATH.to_string())
}

// --- Tests ---

#[test]
fn test_schedule_key_format() {
    assert_eq!(
        schedule_key(GROUP, day()),
        "course-access:bsc-cs-2:2026-10-19"
    );
    let single_digits = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
    assert_eq!(schedule_key("g", single_digits), "course-access:g:2026-03-07");
}

#[test]
fn test_window_serializes_camel_case() {
    let json = serde_json::to_value(window("08:00", "17:00")).unwrap();
    assert_eq!(json["accessDate"], "2026-10-19");
    assert_eq!(json["startTime"], "08:00");
    assert_eq!(json["endTime"], "17:00");
}

#[test]
fn test_window_bounds_anchor_on_day() {
    let (start, end) = window_bounds(&window("08:00", "17:30"), day()).unwrap();
    assert_eq!(start, at(8, 0));
    assert_eq!(end, at(17, 30));
}

#[tokio::test]
async fn test_no_window_allows() {
    let gate = gate_with(MemoryScheduleStore::new());
    assert_eq!(gate.check(GROUP, at(3, 0)).await, Decision::Allow);
}

#[tokio::test]
async fn test_window_boundaries_are_inclusive() {
    let store = MemoryScheduleStore::new();
    store.put_window(GROUP, day(), &window("08:00", "17:00"));
    let gate = gate_with(store);

    assert_eq!(gate.check(GROUP, at(7, 59)).await, closed());
    assert_eq!(gate.check(GROUP, at(8, 0)).await, Decision::Allow);
    assert_eq!(gate.check(GROUP, at(12, 0)).await, Decision::Allow);
    assert_eq!(gate.check(GROUP, at(17, 0)).await, Decision::Allow);
    assert_eq!(gate.check(GROUP, at(17, 1)).await, closed());
}

#[tokio::test]
async fn test_window_for_other_day_does_not_apply() {
    let store = MemoryScheduleStore::new();
    let yesterday = day().pred_opt().unwrap();
    store.put_window(GROUP, yesterday, &window("08:00", "09:00"));
    let gate = gate_with(store);

    assert_eq!(gate.check(GROUP, at(20, 0)).await, Decision::Allow);
}

#[tokio::test]
async fn test_window_for_other_group_does_not_apply() {
    let store = MemoryScheduleStore::new();
    store.put_window("other-group", day(), &window("08:00", "09:00"));
    let gate = gate_with(store);

    assert_eq!(gate.check(GROUP, at(20, 0)).await, Decision::Allow);
}

#[tokio::test]
async fn test_inverted_window_denies_whole_day() {
    let store = MemoryScheduleStore::new();
    store.put_window(GROUP, day(), &window("17:00", "08:00"));
    let gate = gate_with(store);

    for (hour, minute) in [(0, 0), (7, 59), (8, 0), (12, 0), (17, 0), (23, 59)] {
        assert_eq!(gate.check(GROUP, at(hour, minute)).await, closed());
    }
}

#[tokio::test]
async fn test_failing_store_fails_open() {
    let gate = ScheduleGate::new(Arc::new(FailingScheduleStore), CLOSED_ACCESS_PATH);
    assert_eq!(gate.check(GROUP, at(2, 0)).await, Decision::Allow);
}

#[tokio::test]
async fn test_malformed_json_fails_open() {
    let store = MemoryScheduleStore::new();
    store.put_raw(&schedule_key(GROUP, day()), "{not json");

    assert!(matches!(
        store.lookup(&schedule_key(GROUP, day())).await,
        WindowLookup::Error(_)
    ));

    let gate = gate_with(store);
    assert_eq!(gate.check(GROUP, at(2, 0)).await, Decision::Allow);
}

#[tokio::test]
async fn test_unparseable_times_fail_open() {
    let store = MemoryScheduleStore::new();
    store.put_window(GROUP, day(), &window("eight", "17:00"));
    let gate = gate_with(store);

    assert_eq!(gate.check(GROUP, at(2, 0)).await, Decision::Allow);
}

#[tokio::test]
async fn test_removed_window_stops_applying() {
    let store = MemoryScheduleStore::new();
    store.put_window(GROUP, day(), &window("08:00", "09:00"));
    store.remove(&schedule_key(GROUP, day()));

    assert!(matches!(
        store.lookup(&schedule_key(GROUP, day())).await,
        WindowLookup::NotFound
    ));
}

#[tokio::test]
async fn test_found_window_round_trips_through_store() {
    let store = MemoryScheduleStore::new();
    let stored = window("08:00", "17:00");
    store.put_window(GROUP, day(), &stored);

    match store.lookup(&schedule_key(GROUP, day())).await {
        WindowLookup::Found(found) => assert_eq!(found, stored),
        other => panic!("expected a window, got {other:?}"),
    }
}
