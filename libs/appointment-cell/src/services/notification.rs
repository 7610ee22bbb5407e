// libs/appointment-cell/src/services/notification.rs
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentAction};

/// Delivers a text message to the phone number on a portal account.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, user_id: &str, content: &str, auth_token: &str) -> Result<()>;
}

/// Sends SMS through the backend's messaging edge function.
pub struct EdgeFunctionSmsSender {
    supabase: Arc<SupabaseClient>,
    function_path: String,
}

impl EdgeFunctionSmsSender {
    pub fn new(supabase: Arc<SupabaseClient>, function_path: &str) -> Self {
        Self {
            supabase,
            function_path: function_path.to_string(),
        }
    }
}

#[async_trait]
impl SmsSender for EdgeFunctionSmsSender {
    async fn send_sms(&self, user_id: &str, content: &str, auth_token: &str) -> Result<()> {
        let payload = json!({
            "user_id": user_id,
            "content": content,
        });

        self.supabase
            .invoke_function(&self.function_path, payload, Some(auth_token))
            .await?;

        Ok(())
    }
}

pub struct NotificationService {
    sender: Arc<dyn SmsSender>,
    clinic_name: String,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn SmsSender>, clinic_name: &str) -> Self {
        Self {
            sender,
            clinic_name: clinic_name.to_string(),
        }
    }

    /// Tells the patient about an administrative action. Delivery problems
    /// are logged and otherwise ignored.
    pub async fn notify_status_change(
        &self,
        appointment: &Appointment,
        action: AppointmentAction,
        time_zone: Option<&str>,
        auth_token: &str,
    ) {
        let message = compose_message(&self.clinic_name, appointment, action, time_zone);
        debug!("Sending {} SMS for appointment {}", action, appointment.id);

        match self.sender.send_sms(&appointment.user_id, &message, auth_token).await {
            Ok(()) => info!("SMS sent for appointment {}", appointment.id),
            Err(e) => warn!("Failed to send SMS for appointment {}: {}", appointment.id, e),
        }
    }
}

pub fn compose_message(
    clinic_name: &str,
    appointment: &Appointment,
    action: AppointmentAction,
    time_zone: Option<&str>,
) -> String {
    let date_time = format_schedule(appointment.schedule, time_zone);

    match action {
        AppointmentAction::Schedule => format!(
            "Greetings from {}. Your appointment is confirmed for {} with Dr. {}.",
            clinic_name, date_time, appointment.primary_physician
        ),
        AppointmentAction::Cancel => format!(
            "Greetings from {}. We regret to inform that your appointment for {} is cancelled. Reason: {}.",
            clinic_name,
            date_time,
            appointment.cancellation_reason.as_deref().unwrap_or("Not specified")
        ),
        AppointmentAction::Complete => format!(
            "Greetings from {}. Your appointment with Dr. {} on {} has been marked as completed.",
            clinic_name, appointment.primary_physician, date_time
        ),
    }
}

/// Renders e.g. "Oct 25, 2023, 8:30 AM" in the given IANA zone, or UTC when
/// the zone is missing or unknown.
pub fn format_schedule(schedule: DateTime<Utc>, time_zone: Option<&str>) -> String {
    const FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

    match time_zone.and_then(|name| name.parse::<Tz>().ok()) {
        Some(tz) => schedule.with_timezone(&tz).format(FORMAT).to_string(),
        None => schedule.format(FORMAT).to_string(),
    }
}
