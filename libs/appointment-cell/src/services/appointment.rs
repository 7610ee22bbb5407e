// libs/appointment-cell/src/services/appointment.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use patient_cell::{PatientError, PatientService};

use crate::models::{
    Appointment, AppointmentAction, AppointmentError, AppointmentStatus,
    AppointmentsWithPatients, CreateAppointmentRequest, PatientName, RecentAppointments,
    UpdateAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::notification::{EdgeFunctionSmsSender, NotificationService, SmsSender};

pub struct AppointmentService {
    supabase: Arc<SupabaseClient>,
    lifecycle_service: AppointmentLifecycleService,
    notification_service: NotificationService,
    patient_service: PatientService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let sender = Arc::new(EdgeFunctionSmsSender::new(
            Arc::clone(&supabase),
            &config.sms_function_path,
        ));

        Self::with_sender(config, supabase, sender)
    }

    /// Same as `new` but delivers SMS through the given sender.
    pub fn with_sms_sender(config: &AppConfig, sender: Arc<dyn SmsSender>) -> Self {
        Self::with_sender(config, Arc::new(SupabaseClient::new(config)), sender)
    }

    fn with_sender(config: &AppConfig, supabase: Arc<SupabaseClient>, sender: Arc<dyn SmsSender>) -> Self {
        Self {
            supabase,
            lifecycle_service: AppointmentLifecycleService::new(),
            notification_service: NotificationService::new(sender, &config.clinic_name),
            patient_service: PatientService::new(config),
        }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Creating appointment for patient {} with {}", request.patient_id, request.primary_physician);

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Reason for appointment is required".to_string()));
        }
        if request.primary_physician.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Select at least one doctor".to_string()));
        }

        let appointment_data = json!({
            "patient_id": request.patient_id,
            "user_id": request.user_id,
            "primary_physician": request.primary_physician,
            "schedule": request.schedule.to_rfc3339(),
            "status": AppointmentStatus::Pending,
            "reason": request.reason,
            "note": request.note,
            "cancellation_reason": null,
            "reports": [],
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Appointment> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        info!("Appointment {} created", appointment.id);
        Ok(appointment)
    }

    /// Applies an administrative action, persists it and texts the patient.
    pub async fn update_appointment(
        &self,
        appointment_id: &str,
        action: AppointmentAction,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Applying {} to appointment {}", action, appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        let new_status = action.target_status();

        self.lifecycle_service.validate_status_transition(current.status, new_status)?;

        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(new_status));

        if let Some(schedule) = request.schedule {
            update_data.insert("schedule".to_string(), json!(schedule.to_rfc3339()));
        }
        if let Some(primary_physician) = request.primary_physician {
            update_data.insert("primary_physician".to_string(), json!(primary_physician));
        }
        if let Some(note) = request.note {
            update_data.insert("note".to_string(), json!(note));
        }
        match action {
            AppointmentAction::Cancel => {
                update_data.insert("cancellation_reason".to_string(), json!(request.cancellation_reason));
            }
            // Rescheduling a cancelled visit clears the old reason
            AppointmentAction::Schedule if current.status == AppointmentStatus::Cancelled => {
                update_data.insert("cancellation_reason".to_string(), Value::Null);
            }
            _ => {}
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let updated = result
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)?;

        info!("Appointment {} moved from {} to {}", appointment_id, current.status, updated.status);

        self.notification_service
            .notify_status_change(&updated, action, request.time_zone.as_deref(), auth_token)
            .await;

        Ok(updated)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    pub async fn get_appointments_by_patient(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?patient_id=eq.{}&order=schedule.asc", patient_id);

        self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// Every appointment, newest booking first, with per-status counts.
    pub async fn get_recent_appointments(&self, auth_token: &str) -> Result<RecentAppointments, AppointmentError> {
        let documents: Vec<Appointment> = self.supabase.request(
            Method::GET,
            "/rest/v1/appointments?order=created_at.desc",
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(summarize_appointments(documents))
    }

    /// A patient's appointments plus the names of every patient profile on
    /// the same account, keyed by patient id.
    pub async fn get_appointments_with_patient_info(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<AppointmentsWithPatients, AppointmentError> {
        let appointments = self.get_appointments_by_patient(patient_id, auth_token).await?;

        let patient = match self.patient_service.find_patient(patient_id, auth_token).await {
            Ok(patient) => Some(patient),
            Err(e) if matches!(e.downcast_ref::<PatientError>(), Some(PatientError::NotFound)) => {
                warn!("No patient found for patient or user id: {}", patient_id);
                None
            }
            Err(e) => return Err(AppointmentError::DatabaseError(e.to_string())),
        };

        let mut patients_map = HashMap::new();
        if let Some(patient) = patient {
            let household = self.patient_service
                .patients_for_user(&patient.user_id, auth_token)
                .await
                .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

            for member in household {
                let name = if member.name.trim().is_empty() {
                    "Unknown Patient".to_string()
                } else {
                    member.name
                };
                patients_map.insert(member.id, PatientName { name });
            }
        }

        Ok(AppointmentsWithPatients {
            appointments,
            patients_map,
        })
    }
}

pub fn summarize_appointments(documents: Vec<Appointment>) -> RecentAppointments {
    let count = |status: AppointmentStatus| documents.iter().filter(|a| a.status == status).count();

    RecentAppointments {
        total_count: documents.len(),
        scheduled_count: count(AppointmentStatus::Scheduled),
        pending_count: count(AppointmentStatus::Pending),
        cancelled_count: count(AppointmentStatus::Cancelled),
        completed_count: count(AppointmentStatus::Completed),
        documents,
    }
}
