use chrono::{NaiveDate, NaiveDateTime, Weekday};

use doctor_cell::models::{TimeRange, WeeklyAvailability};
use doctor_cell::services::availability_codec::decode_weekly;
use doctor_cell::services::slots::{derive_slots, is_date_selectable, selectable_dates, MAX_SELECTABLE_DAYS};

// 2030-03-04 is a Monday
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()
}

fn at(date: NaiveDate, hh: u32, mm: u32) -> NaiveDateTime {
    date.and_hms_opt(hh, mm, 0).unwrap()
}

fn long_before() -> NaiveDateTime {
    at(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 12, 0)
}

#[test]
fn test_absent_availability_yields_nothing() {
    assert!(derive_slots(None, monday(), long_before()).is_empty());
}

#[test]
fn test_empty_weekday_yields_nothing() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Tue, "09:00", "17:00");

    assert!(derive_slots(Some(&availability), monday(), long_before()).is_empty());
}

#[test]
fn test_single_hour_range_on_future_date() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "09:00", "10:00");

    let slots = derive_slots(Some(&availability), monday(), long_before());

    assert_eq!(slots, vec![at(monday(), 9, 0), at(monday(), 9, 30)]);
}

#[test]
fn test_partial_step_keeps_only_full_start() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "09:00", "09:20");

    let slots = derive_slots(Some(&availability), monday(), long_before());

    assert_eq!(slots, vec![at(monday(), 9, 0)]);
}

#[test]
fn test_today_drops_elapsed_slots() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "09:00", "11:00");

    let slots = derive_slots(Some(&availability), monday(), at(monday(), 9, 45));

    assert_eq!(slots, vec![at(monday(), 10, 0), at(monday(), 10, 30)]);
}

#[test]
fn test_slot_equal_to_now_is_dropped() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "09:00", "10:00");

    let slots = derive_slots(Some(&availability), monday(), at(monday(), 9, 30));

    assert!(slots.is_empty());
}

#[test]
fn test_past_filter_only_applies_to_same_day() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "09:00", "10:00");
    let sunday_evening = at(NaiveDate::from_ymd_opt(2030, 3, 3).unwrap(), 23, 59);

    let slots = derive_slots(Some(&availability), monday(), sunday_evening);

    assert_eq!(slots.len(), 2);
}

#[test]
fn test_malformed_range_is_skipped() {
    let availability = WeeklyAvailability::new()
        .with_range(Weekday::Mon, "9am", "10:00")
        .with_range(Weekday::Mon, "25:00", "26:00")
        .with_range(Weekday::Mon, "13:00", "13:30");

    let slots = derive_slots(Some(&availability), monday(), long_before());

    assert_eq!(slots, vec![at(monday(), 13, 0)]);
}

#[test]
fn test_inverted_range_yields_nothing() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "17:00", "09:00");

    assert!(derive_slots(Some(&availability), monday(), long_before()).is_empty());
}

#[test]
fn test_multiple_ranges_keep_list_order() {
    let availability = WeeklyAvailability::new()
        .with_range(Weekday::Mon, "14:00", "15:00")
        .with_range(Weekday::Mon, "08:00", "09:00");

    let slots = derive_slots(Some(&availability), monday(), long_before());

    assert_eq!(
        slots,
        vec![
            at(monday(), 14, 0),
            at(monday(), 14, 30),
            at(monday(), 8, 0),
            at(monday(), 8, 30),
        ]
    );
}

#[test]
fn test_overlapping_ranges_keep_duplicates() {
    let availability = WeeklyAvailability::new()
        .with_range(Weekday::Mon, "09:00", "10:00")
        .with_range(Weekday::Mon, "09:30", "10:00");

    let slots = derive_slots(Some(&availability), monday(), long_before());

    assert_eq!(slots.len(), 3);
    assert_eq!(slots.iter().filter(|s| **s == at(monday(), 9, 30)).count(), 2);
}

#[test]
fn test_derivation_is_deterministic() {
    let availability = WeeklyAvailability::new()
        .with_range(Weekday::Mon, "08:00", "09:00")
        .with_range(Weekday::Mon, "14:00", "15:00");
    let now = at(monday(), 8, 10);

    let first = derive_slots(Some(&availability), monday(), now);
    let second = derive_slots(Some(&availability), monday(), now);

    assert_eq!(first, second);
    assert_eq!(first, vec![at(monday(), 8, 30), at(monday(), 14, 0), at(monday(), 14, 30)]);
}

#[test]
fn test_decoded_ranges_feed_the_deriver() {
    let availability = decode_weekly(r#"{"Monday": ["08:00-09:00", "14:00-15:00", "broken"]}"#);

    let slots = derive_slots(Some(&availability), monday(), long_before());

    assert_eq!(
        slots,
        vec![
            at(monday(), 8, 0),
            at(monday(), 8, 30),
            at(monday(), 14, 0),
            at(monday(), 14, 30),
        ]
    );
    assert_eq!(availability.ranges(Weekday::Mon)[2], TimeRange::new("broken", ""));
}

#[test]
fn test_date_with_all_slots_elapsed_is_not_selectable() {
    let availability = WeeklyAvailability::new().with_range(Weekday::Mon, "09:00", "10:00");

    assert!(is_date_selectable(Some(&availability), monday(), at(monday(), 8, 0)));
    assert!(!is_date_selectable(Some(&availability), monday(), at(monday(), 9, 30)));
}

#[test]
fn test_selectable_dates_follow_weekly_pattern() {
    let availability = WeeklyAvailability::new()
        .with_range(Weekday::Mon, "09:00", "10:00")
        .with_range(Weekday::Wed, "14:00", "15:00");

    let dates = selectable_dates(Some(&availability), monday(), 14, at(monday(), 12, 0));

    let expected: Vec<NaiveDate> = [6, 11, 13]
        .iter()
        .map(|day| NaiveDate::from_ymd_opt(2030, 3, *day).unwrap())
        .collect();
    assert_eq!(dates, expected);
}

#[test]
fn test_selectable_dates_window_is_capped() {
    let availability = WeeklyAvailability::new()
        .with_range(Weekday::Mon, "09:00", "10:00")
        .with_range(Weekday::Tue, "09:00", "10:00")
        .with_range(Weekday::Wed, "09:00", "10:00")
        .with_range(Weekday::Thu, "09:00", "10:00")
        .with_range(Weekday::Fri, "09:00", "10:00")
        .with_range(Weekday::Sat, "09:00", "10:00")
        .with_range(Weekday::Sun, "09:00", "10:00");

    let dates = selectable_dates(Some(&availability), monday(), 365, long_before());

    assert_eq!(dates.len(), MAX_SELECTABLE_DAYS as usize);
}
