// libs/appointment-cell/src/models.rs
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub user_id: String,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: String,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_reports")]
    pub reports: Vec<Report>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Cancelled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Administrative action taken from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Schedule,
    Cancel,
    Complete,
}

impl AppointmentAction {
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            AppointmentAction::Schedule => AppointmentStatus::Scheduled,
            AppointmentAction::Cancel => AppointmentStatus::Cancelled,
            AppointmentAction::Complete => AppointmentStatus::Completed,
        }
    }
}

impl FromStr for AppointmentAction {
    type Err = AppointmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "schedule" => Ok(AppointmentAction::Schedule),
            "cancel" => Ok(AppointmentAction::Cancel),
            "complete" => Ok(AppointmentAction::Complete),
            other => Err(AppointmentError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for AppointmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentAction::Schedule => write!(f, "schedule"),
            AppointmentAction::Cancel => write!(f, "cancel"),
            AppointmentAction::Complete => write!(f, "complete"),
        }
    }
}

// ==============================================================================
// REPORTS
// ==============================================================================

/// A medical file attached to an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub url: String,
    #[serde(rename = "type")]
    pub report_type: String,
    #[serde(default, alias = "fileName")]
    pub file_name: Option<String>,
    #[serde(default, alias = "uploadedAt")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Reports are persisted as a list of JSON-encoded strings. Older rows may
/// hold plain objects instead, so both shapes are accepted and entries that
/// fit neither are left out of the typed view.
pub fn deserialize_reports<'de, D>(deserializer: D) -> Result<Vec<Report>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(decode_reports(raw.unwrap_or_default()))
}

pub fn decode_reports<I>(entries: I) -> Vec<Report>
where
    I: IntoIterator<Item = Value>,
{
    entries.into_iter().filter_map(decode_report).collect()
}

fn decode_report(entry: Value) -> Option<Report> {
    let decoded = match entry {
        Value::String(encoded) => serde_json::from_str(&encoded),
        other => serde_json::from_value(other),
    };

    match decoded {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Skipping unreadable report entry: {}", e);
            None
        }
    }
}

/// Storage form of an existing entry. Strings are kept verbatim so entries
/// the typed view cannot read survive a rewrite of the column.
pub fn encode_stored_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::Null => None,
        Value::String(encoded) => Some(encoded.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

pub fn encode_report(report: &Report) -> Option<String> {
    serde_json::to_string(report).ok()
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub user_id: String,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub reason: String,
    pub note: Option<String>,
}

/// Fields an administrator may change while acting on an appointment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub primary_physician: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
    /// IANA zone used to render the date in the SMS.
    pub time_zone: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentAppointments {
    pub total_count: usize,
    pub scheduled_count: usize,
    pub pending_count: usize,
    pub cancelled_count: usize,
    pub completed_count: usize,
    pub documents: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentsWithPatients {
    pub appointments: Vec<Appointment>,
    pub patients_map: HashMap<String, PatientName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorStats {
    pub doctor: String,
    pub appointments: usize,
    pub cancellations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAnalytics {
    pub total_appointments: usize,
    pub total_cancellations: usize,
    pub doctor_stats: Vec<DoctorStats>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Unknown appointment action: {0}")]
    InvalidAction(String),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No file provided")]
    EmptyReport,

    #[error("Reports must be an array")]
    InvalidReports,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reports_accept_encoded_and_plain_entries() {
        let row = json!({
            "id": "appt-1",
            "patient_id": "patient-1",
            "user_id": "user-1",
            "primary_physician": "Dr. Ada Byrne",
            "schedule": "2030-03-04T10:00:00Z",
            "status": "scheduled",
            "reason": "Check-up",
            "note": null,
            "cancellation_reason": null,
            "reports": [
                "{\"url\":\"https://files/a.pdf\",\"type\":\"Lab\",\"file_name\":\"a.pdf\",\"uploaded_at\":\"2030-03-04T11:00:00Z\"}",
                {"url": "https://files/b.png", "type": "Scan", "fileName": "b.png", "uploadedAt": "2030-03-05T11:00:00Z"},
                "not json"
            ],
            "created_at": null
        });

        let appointment: Appointment = serde_json::from_value(row).unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.reports.len(), 2);
        assert_eq!(appointment.reports[0].report_type, "Lab");
        assert_eq!(appointment.reports[1].file_name.as_deref(), Some("b.png"));
    }

    #[test]
    fn test_report_without_timestamp_is_readable() {
        let reports = decode_reports(vec![
            json!("{\"url\":\"https://files/old.pdf\",\"type\":\"Lab\",\"fileName\":\"old.pdf\"}"),
        ]);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].file_name.as_deref(), Some("old.pdf"));
        assert!(reports[0].uploaded_at.is_none());
    }

    #[test]
    fn test_stored_entries_keep_their_encoding() {
        assert_eq!(encode_stored_entry(&json!("not json")).as_deref(), Some("not json"));
        assert_eq!(
            encode_stored_entry(&json!({"url": "https://files/b.png"})).as_deref(),
            Some("{\"url\":\"https://files/b.png\"}")
        );
        assert!(encode_stored_entry(&Value::Null).is_none());
    }

    #[test]
    fn test_null_reports_are_empty() {
        let row = json!({
            "id": "appt-1",
            "patient_id": "patient-1",
            "user_id": "user-1",
            "primary_physician": "Dr. Ada Byrne",
            "schedule": "2030-03-04T10:00:00Z",
            "status": "pending",
            "reason": "Check-up",
            "reports": null
        });

        let appointment: Appointment = serde_json::from_value(row).unwrap();
        assert!(appointment.reports.is_empty());
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("cancel".parse::<AppointmentAction>().unwrap(), AppointmentAction::Cancel);
        assert_eq!(AppointmentAction::Schedule.target_status(), AppointmentStatus::Scheduled);
        assert!("reschedule".parse::<AppointmentAction>().is_err());
    }
}
