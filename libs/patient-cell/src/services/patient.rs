use anyhow::{Result, anyhow};
use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{StoredObject, SupabaseClient};
use shared_utils::payload::decode_base64_payload;
use shared_utils::validation::{is_e164_phone, is_valid_email};

use crate::models::{
    CreateUserRequest, IdentificationDocument, Patient, PatientError, PortalUser,
    RegisterPatientRequest,
};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Returns the account already registered under this email, or creates one.
    pub async fn create_user(&self, request: CreateUserRequest, auth_token: &str) -> Result<PortalUser> {
        debug!("Creating portal user for: {}", request.email);

        validate_contact(&request.email, &request.phone)?;

        let existing_path = format!(
            "/rest/v1/users?email=eq.{}",
            urlencoding::encode(&request.email)
        );
        let existing: Vec<PortalUser> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if let Some(user) = existing.into_iter().next() {
            info!("User with email {} already exists, reusing {}", request.email, user.id);
            return Ok(user);
        }

        let user_data = json!({
            "name": request.name,
            "email": request.email,
            "phone": request.phone,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<PortalUser> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/users",
            Some(auth_token),
            Some(user_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let user = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create user"))?;

        info!("User created with ID: {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str, auth_token: &str) -> Result<PortalUser> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<PortalUser> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::UserNotFound.into())
    }

    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Registering patient for user: {}", request.user_id);

        validate_contact(&request.email, &request.phone)?;
        if !request.privacy_consent {
            return Err(PatientError::ValidationError(
                "You must consent to the privacy policy in order to proceed".to_string(),
            ).into());
        }

        let mut patient_data = json!({
            "user_id": request.user_id,
            "name": request.name,
            "email": request.email,
            "phone": request.phone,
            "birth_date": request.birth_date,
            "gender": request.gender,
            "address": request.address,
            "occupation": request.occupation,
            "emergency_contact_name": request.emergency_contact_name,
            "emergency_contact_number": request.emergency_contact_number,
            "primary_physician": request.primary_physician,
            "insurance_provider": request.insurance_provider,
            "insurance_policy_number": request.insurance_policy_number,
            "allergies": request.allergies,
            "current_medication": request.current_medication,
            "family_medical_history": request.family_medical_history,
            "past_medical_history": request.past_medical_history,
            "identification_type": request.identification_type,
            "identification_number": request.identification_number,
            "identification_document_id": null,
            "identification_document_url": null,
            "privacy_consent": request.privacy_consent,
            "created_at": Utc::now().to_rfc3339()
        });

        if let Some(document) = &request.identification_document {
            let stored = self.upload_document(document, auth_token).await?;
            patient_data["identification_document_id"] = json!(stored.path);
            patient_data["identification_document_url"] = json!(stored.public_url);
        }

        let result: Vec<Patient> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patients",
            Some(auth_token),
            Some(patient_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let patient = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to register patient"))?;

        info!("Patient registered with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn get_patient_by_user(&self, user_id: &str, auth_token: &str) -> Result<Patient> {
        self.first_patient_where("user_id", user_id, auth_token)
            .await?
            .ok_or_else(|| PatientError::NotFound.into())
    }

    /// Looks a patient up by row id first, then treats the value as a user id.
    pub async fn find_patient(&self, id: &str, auth_token: &str) -> Result<Patient> {
        match self.first_patient_where("id", id, auth_token).await {
            Ok(Some(patient)) => return Ok(patient),
            Ok(None) => {}
            // Non-uuid values are rejected by the id column; they may still be user ids
            Err(e) => debug!("Lookup by patient id {} failed: {}", id, e),
        }

        match self.first_patient_where("user_id", id, auth_token).await? {
            Some(patient) => Ok(patient),
            None => {
                warn!("No patient found for id or user id: {}", id);
                Err(PatientError::NotFound.into())
            }
        }
    }

    /// All patient rows registered under one account.
    pub async fn patients_for_user(&self, user_id: &str, auth_token: &str) -> Result<Vec<Patient>> {
        let path = format!("/rest/v1/patients?user_id=eq.{}", user_id);
        self.supabase.request(Method::GET, &path, Some(auth_token), None).await
    }

    async fn first_patient_where(&self, column: &str, value: &str, auth_token: &str) -> Result<Option<Patient>> {
        let path = format!("/rest/v1/patients?{}=eq.{}&limit=1", column, value);
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    async fn upload_document(&self, document: &IdentificationDocument, auth_token: &str) -> Result<StoredObject> {
        let bytes = decode_base64_payload(&document.file_data)
            .map_err(|e| PatientError::InvalidDocument(e.to_string()))?;
        let content_type = document.content_type.as_deref().unwrap_or("application/octet-stream");

        self.supabase
            .upload_object("identification", &document.file_name, content_type, bytes, Some(auth_token))
            .await
    }
}

fn validate_contact(email: &str, phone: &str) -> Result<(), PatientError> {
    if !is_valid_email(email) {
        return Err(PatientError::ValidationError("Invalid email address".to_string()));
    }
    if !is_e164_phone(phone) {
        return Err(PatientError::ValidationError("Invalid phone number".to_string()));
    }
    Ok(())
}
