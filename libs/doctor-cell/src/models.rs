use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use uuid::Uuid;

/// Monday-first, matching the order the roster editor shows.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

/// One working window inside a day, as entered by an administrator.
///
/// The raw "HH:MM" strings are kept as-is; a range whose bounds do not parse
/// simply yields no slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((parse_hhmm(&self.start)?, parse_hhmm(&self.end)?))
    }
}

/// Strict 24-hour "HH:MM".
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }

    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let hour = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
    let minute = u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0');

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Recurring weekly working hours, one ordered range list per weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, Vec<TimeRange>>")]
pub struct WeeklyAvailability {
    days: [Vec<TimeRange>; 7],
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self, day: Weekday) -> &[TimeRange] {
        &self.days[day.num_days_from_monday() as usize]
    }

    pub fn set_ranges(&mut self, day: Weekday, ranges: Vec<TimeRange>) {
        self.days[day.num_days_from_monday() as usize] = ranges;
    }

    pub fn push(&mut self, day: Weekday, range: TimeRange) {
        self.days[day.num_days_from_monday() as usize].push(range);
    }

    pub fn with_range(mut self, day: Weekday, start: &str, end: &str) -> Self {
        self.push(day, TimeRange::new(start, end));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[TimeRange])> {
        WEEKDAYS.iter().map(move |day| (*day, self.ranges(*day)))
    }
}

impl TryFrom<HashMap<String, Vec<TimeRange>>> for WeeklyAvailability {
    type Error = String;

    fn try_from(map: HashMap<String, Vec<TimeRange>>) -> Result<Self, Self::Error> {
        let mut availability = WeeklyAvailability::new();
        for (name, ranges) in map {
            let day: Weekday = name
                .parse()
                .map_err(|_| format!("unknown weekday '{}'", name))?;
            availability.set_ranges(day, ranges);
        }
        Ok(availability)
    }
}

impl Serialize for WeeklyAvailability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(WEEKDAYS.len()))?;
        for (day, ranges) in self.iter() {
            map.serialize_entry(weekday_name(day), ranges)?;
        }
        map.end()
    }
}

// ==============================================================================
// DOCTOR
// ==============================================================================

/// Doctor row as stored by the backend; availability is a JSON-encoded string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    pub availability: WeeklyAvailability,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub file_data: String, // Base64, optionally with a data: URL prefix
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub image: Option<DoctorImageUpload>,
    #[serde(default)]
    pub availability: WeeklyAvailability,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub image: Option<DoctorImageUpload>,
    pub availability: Option<WeeklyAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDoctorResult {
    pub success: bool,
    pub message: String,
    pub deleted_appointments: usize,
}

// ==============================================================================
// SLOT RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slots: Vec<NaiveDateTime>,
    pub total_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectableDatesResponse {
    pub doctor_id: String,
    pub from: NaiveDate,
    pub days: u32,
    pub dates: Vec<NaiveDate>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid image upload: {0}")]
    InvalidImage(String),
}
