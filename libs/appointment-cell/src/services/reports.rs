// libs/appointment-cell/src/services/reports.rs
use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{decode_reports, encode_report, encode_stored_entry, AppointmentError, Report};

pub const DEFAULT_REPORT_TYPE: &str = "Other";

/// A file received from the dashboard, ready to be stored.
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub report_type: Option<String>,
}

/// The raw `reports` column, entries untouched.
#[derive(Debug, Deserialize)]
struct StoredReports {
    #[serde(default)]
    reports: Option<Vec<Value>>,
}

pub struct ReportService {
    supabase: SupabaseClient,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_reports(&self, appointment_id: &str, auth_token: &str) -> Result<Vec<Report>, AppointmentError> {
        let stored = self.fetch_stored_reports(appointment_id, auth_token).await?;
        Ok(decode_reports(stored))
    }

    /// Stores the file and appends it to the appointment's report list.
    /// Existing entries are written back exactly as they were read.
    pub async fn upload_report(
        &self,
        appointment_id: &str,
        upload: ReportUpload,
        auth_token: &str,
    ) -> Result<Vec<Report>, AppointmentError> {
        if upload.bytes.is_empty() {
            return Err(AppointmentError::EmptyReport);
        }

        let stored = self.fetch_stored_reports(appointment_id, auth_token).await?;
        debug!("Uploading {} for appointment {}", upload.file_name, appointment_id);

        let object = self.supabase
            .upload_object(
                &format!("reports/{}", appointment_id),
                &upload.file_name,
                &upload.content_type,
                upload.bytes,
                Some(auth_token),
            )
            .await
            .map_err(|e| AppointmentError::StorageError(e.to_string()))?;

        let report_type = upload
            .report_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REPORT_TYPE.to_string());

        let report = Report {
            url: object.public_url,
            report_type,
            file_name: Some(upload.file_name),
            uploaded_at: Some(Utc::now()),
        };

        let mut encoded: Vec<String> = stored.iter().filter_map(encode_stored_entry).collect();
        encoded.push(
            encode_report(&report)
                .ok_or_else(|| AppointmentError::ValidationError("Report could not be encoded".to_string()))?,
        );

        self.write_reports(appointment_id, &encoded, auth_token).await?;
        info!("Appointment {} now has {} reports", appointment_id, encoded.len());

        Ok(decode_reports(encoded.into_iter().map(Value::String)))
    }

    /// Overwrites the report list, used by the dashboard to remove or edit entries.
    pub async fn replace_reports(
        &self,
        appointment_id: &str,
        reports: Value,
        auth_token: &str,
    ) -> Result<Vec<Report>, AppointmentError> {
        let Value::Array(entries) = reports else {
            return Err(AppointmentError::InvalidReports);
        };

        let encoded: Vec<String> = entries.iter().filter_map(encode_stored_entry).collect();
        self.write_reports(appointment_id, &encoded, auth_token).await?;

        Ok(decode_reports(entries))
    }

    async fn fetch_stored_reports(&self, appointment_id: &str, auth_token: &str) -> Result<Vec<Value>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select=reports", appointment_id);
        let result: Vec<StoredReports> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|row| row.reports.unwrap_or_default())
            .ok_or(AppointmentError::NotFound)
    }

    async fn write_reports(&self, appointment_id: &str, encoded: &[String], auth_token: &str) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let body = json!({ "reports": encoded });

        let updated: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        Ok(())
    }
}
