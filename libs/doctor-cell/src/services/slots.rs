//! Turns a doctor's weekly working hours into bookable times for one date.
//!
//! Everything here runs in a single local reference frame: the "HH:MM"
//! strings, the target date and `now` are all wall-clock values of the
//! practice, so no zone conversion happens.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::models::{weekday_name, WeeklyAvailability};

/// Step between consecutive slots inside a range.
pub const SLOT_GRANULARITY_MINUTES: i64 = 30;

/// Longest window `selectable_dates` will scan.
pub const MAX_SELECTABLE_DAYS: u32 = 62;

/// Bookable start times for `target_date`, in range-list order.
///
/// Ranges are half-open (`end` is never a slot), malformed ranges are
/// skipped, and when `target_date` is the same day as `now` only slots
/// strictly after `now` survive. Ranges are neither sorted nor merged, so
/// overlapping entries produce duplicate slots.
pub fn derive_slots(
    availability: Option<&WeeklyAvailability>,
    target_date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let Some(availability) = availability else {
        return Vec::new();
    };

    let weekday = target_date.weekday();
    let is_today = now.date() == target_date;
    let step = Duration::minutes(SLOT_GRANULARITY_MINUTES);

    let mut slots = Vec::new();
    for range in availability.ranges(weekday) {
        let Some((start, end)) = range.bounds() else {
            warn!(
                "Skipping malformed {} range {:?}-{:?}",
                weekday_name(weekday), range.start, range.end
            );
            continue;
        };

        let slot_end = target_date.and_time(end);
        let mut cursor = target_date.and_time(start);

        while cursor < slot_end {
            if !is_today || cursor > now {
                slots.push(cursor);
            }
            cursor += step;
        }
    }

    slots
}

pub fn is_date_selectable(
    availability: Option<&WeeklyAvailability>,
    date: NaiveDate,
    now: NaiveDateTime,
) -> bool {
    !derive_slots(availability, date, now).is_empty()
}

/// Dates in `[from, from + days)` that still have at least one bookable slot.
pub fn selectable_dates(
    availability: Option<&WeeklyAvailability>,
    from: NaiveDate,
    days: u32,
    now: NaiveDateTime,
) -> Vec<NaiveDate> {
    from.iter_days()
        .take(days.min(MAX_SELECTABLE_DAYS) as usize)
        .filter(|date| is_date_selectable(availability, *date, now))
        .collect()
}
