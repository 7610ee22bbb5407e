use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use futures::future::join_all;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{StoredObject, SupabaseClient};
use shared_utils::payload::decode_base64_payload;
use shared_utils::validation::{is_international_phone, is_valid_email};

use crate::models::{
    CreateDoctorRequest, DeleteDoctorResult, Doctor, DoctorError, DoctorImageUpload,
    DoctorRecord, UpdateDoctorRequest,
};
use crate::services::availability_codec::{decode_weekly, encode_weekly};
use crate::services::slots;

impl From<DoctorRecord> for Doctor {
    fn from(record: DoctorRecord) -> Self {
        let availability = record
            .availability
            .as_deref()
            .map(decode_weekly)
            .unwrap_or_default();

        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            specialization: record.specialization,
            experience: record.experience,
            image_id: record.image_id,
            image_url: record.image_url,
            availability,
            created_at: record.created_at,
        }
    }
}

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor> {
        debug!("Creating doctor: {}", request.name);

        validate_doctor_fields(
            Some(&request.name),
            request.email.as_deref(),
            request.phone.as_deref(),
            request.experience,
        )?;

        let mut doctor_data = json!({
            "name": request.name,
            "email": request.email,
            "phone": request.phone,
            "specialization": request.specialization,
            "experience": request.experience,
            "availability": encode_weekly(&request.availability),
            "created_at": Utc::now().to_rfc3339()
        });

        if let Some(image) = request.image {
            let stored = self.upload_image(&image, auth_token).await?;
            doctor_data["image_id"] = json!(stored.path);
            doctor_data["image_url"] = json!(stored.public_url);
        }

        let result: Vec<DoctorRecord> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/doctors",
            Some(auth_token),
            Some(doctor_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let record = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create doctor"))?;

        info!("Doctor created with ID: {}", record.id);
        Ok(record.into())
    }

    pub async fn list_doctors(&self, auth_token: Option<&str>) -> Result<Vec<Doctor>> {
        debug!("Listing doctors");

        let records: Vec<DoctorRecord> = self.supabase.request(
            Method::GET,
            "/rest/v1/doctors?order=name.asc",
            auth_token,
            None,
        ).await?;

        Ok(records.into_iter().map(Doctor::from).collect())
    }

    pub async fn get_doctor(&self, doctor_id: &str, auth_token: Option<&str>) -> Result<Doctor> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let records: Vec<DoctorRecord> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        records
            .into_iter()
            .next()
            .map(Doctor::from)
            .ok_or_else(|| DoctorError::NotFound.into())
    }

    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor> {
        debug!("Updating doctor: {}", doctor_id);

        validate_doctor_fields(
            request.name.as_deref(),
            request.email.as_deref(),
            request.phone.as_deref(),
            request.experience,
        )?;

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(experience) = request.experience {
            update_data.insert("experience".to_string(), json!(experience));
        }
        if let Some(availability) = request.availability {
            update_data.insert("availability".to_string(), json!(encode_weekly(&availability)));
        }
        if let Some(image) = request.image {
            let stored = self.upload_image(&image, auth_token).await?;
            update_data.insert("image_id".to_string(), json!(stored.path));
            update_data.insert("image_url".to_string(), json!(stored.public_url));
        }

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<DoctorRecord> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result
            .into_iter()
            .next()
            .map(Doctor::from)
            .ok_or_else(|| DoctorError::NotFound.into())
    }

    /// Removes a doctor together with their appointments and profile image.
    ///
    /// Appointments reference the doctor either by id or by display name.
    /// Individual appointment or image deletions may fail without aborting
    /// the removal of the doctor row.
    pub async fn delete_doctor(&self, doctor_id: &str, auth_token: &str) -> Result<DeleteDoctorResult> {
        let doctor = self.get_doctor(doctor_id, Some(auth_token)).await?;
        debug!("Deleting doctor {} ({})", doctor.name, doctor.id);

        let appointments_path = format!(
            "/rest/v1/appointments?select=id&or=(primary_physician.eq.{},primary_physician.eq.\"{}\")",
            doctor.id,
            urlencoding::encode(&doctor.name),
        );
        let appointments: Vec<Value> = self.supabase.request(
            Method::GET,
            &appointments_path,
            Some(auth_token),
            None,
        ).await?;

        info!("Found {} appointments to delete for doctor: {}", appointments.len(), doctor.name);

        let deletions = appointments
            .iter()
            .filter_map(|row| row["id"].as_str())
            .map(|appointment_id| async move {
                let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
                let result: Result<Value> = self.supabase.request(
                    Method::DELETE,
                    &path,
                    Some(auth_token),
                    None,
                ).await;
                if let Err(e) = &result {
                    warn!("Failed to delete appointment {}: {}", appointment_id, e);
                }
                result.is_ok()
            });

        let deleted_appointments = join_all(deletions)
            .await
            .into_iter()
            .filter(|deleted| *deleted)
            .count();

        if let Some(image_id) = &doctor.image_id {
            if let Err(e) = self.supabase.delete_object(image_id, Some(auth_token)).await {
                warn!("Failed to delete doctor image {}: {}", image_id, e);
            }
        }

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor.id);
        let _: Value = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        info!("Deleted doctor {} and {} appointments", doctor.name, deleted_appointments);

        Ok(DeleteDoctorResult {
            success: true,
            message: format!(
                "Doctor {} and {} associated appointments deleted successfully",
                doctor.name, deleted_appointments
            ),
            deleted_appointments,
        })
    }

    pub async fn available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>> {
        let doctor = self.get_doctor(doctor_id, None).await?;
        let slots = slots::derive_slots(Some(&doctor.availability), date, now);

        debug!("Doctor {} has {} slots on {}", doctor_id, slots.len(), date);
        Ok(slots)
    }

    pub async fn selectable_dates(
        &self,
        doctor_id: &str,
        from: NaiveDate,
        days: u32,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveDate>> {
        let doctor = self.get_doctor(doctor_id, None).await?;
        Ok(slots::selectable_dates(Some(&doctor.availability), from, days, now))
    }

    async fn upload_image(&self, image: &DoctorImageUpload, auth_token: &str) -> Result<StoredObject> {
        let bytes = decode_base64_payload(&image.file_data)
            .map_err(|e| DoctorError::InvalidImage(e.to_string()))?;
        let content_type = image.content_type.as_deref().unwrap_or("application/octet-stream");

        self.supabase
            .upload_object("doctors", &image.file_name, content_type, bytes, Some(auth_token))
            .await
    }
}

pub fn validate_doctor_fields(
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    experience: Option<i32>,
) -> Result<(), DoctorError> {
    if let Some(name) = name {
        if name.trim().chars().count() < 2 {
            return Err(DoctorError::ValidationError("Name is required".to_string()));
        }
    }
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        if !is_valid_email(email) {
            return Err(DoctorError::ValidationError("Invalid email".to_string()));
        }
    }
    if let Some(phone) = phone.filter(|p| !p.is_empty()) {
        if !is_international_phone(phone) {
            return Err(DoctorError::ValidationError(
                "Phone number must be in international format (e.g., +919876543210)".to_string(),
            ));
        }
    }
    if experience.is_some_and(|years| years < 0) {
        return Err(DoctorError::ValidationError("Experience cannot be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_doctor_fields() {
        assert!(validate_doctor_fields(Some("Dr. Ada"), Some("ada@clinic.ie"), Some("+353871234567"), Some(3)).is_ok());
        assert!(validate_doctor_fields(None, None, None, None).is_ok());
        assert!(validate_doctor_fields(Some("A"), None, None, None).is_err());
        assert!(validate_doctor_fields(None, Some("nope"), None, None).is_err());
        assert!(validate_doctor_fields(None, None, Some("0871234567"), None).is_err());
        assert!(validate_doctor_fields(None, None, None, Some(-1)).is_err());
    }
}
