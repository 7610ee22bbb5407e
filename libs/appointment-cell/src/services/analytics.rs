// libs/appointment-cell/src/services/analytics.rs
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AdminAnalytics, AppointmentError, AppointmentStatus, DoctorStats};

const UNKNOWN_DOCTOR: &str = "Unknown";

/// Only the columns the dashboard groups on.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSummaryRow {
    pub primary_physician: Option<String>,
    pub status: AppointmentStatus,
}

pub struct AnalyticsService {
    supabase: SupabaseClient,
}

impl AnalyticsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn admin_analytics(
        &self,
        filter_doctor: Option<&str>,
        auth_token: &str,
    ) -> Result<AdminAnalytics, AppointmentError> {
        let rows: Vec<AppointmentSummaryRow> = self.supabase.request(
            Method::GET,
            "/rest/v1/appointments?select=primary_physician,status&order=created_at.asc",
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        debug!("Aggregating {} appointments", rows.len());
        Ok(aggregate(&rows, filter_doctor))
    }
}

/// Per-doctor visit and cancellation counts, in first-seen order.
pub fn aggregate(rows: &[AppointmentSummaryRow], filter_doctor: Option<&str>) -> AdminAnalytics {
    let mut doctor_stats: Vec<DoctorStats> = Vec::new();

    for row in rows {
        let doctor = row
            .primary_physician
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_DOCTOR);

        if filter_doctor.is_some_and(|wanted| wanted != doctor) {
            continue;
        }

        let index = match doctor_stats.iter().position(|stats| stats.doctor == doctor) {
            Some(index) => index,
            None => {
                doctor_stats.push(DoctorStats {
                    doctor: doctor.to_string(),
                    appointments: 0,
                    cancellations: 0,
                });
                doctor_stats.len() - 1
            }
        };

        if row.status == AppointmentStatus::Cancelled {
            doctor_stats[index].cancellations += 1;
        } else {
            doctor_stats[index].appointments += 1;
        }
    }

    AdminAnalytics {
        total_appointments: doctor_stats.iter().map(|s| s.appointments).sum(),
        total_cancellations: doctor_stats.iter().map(|s| s.cancellations).sum(),
        doctor_stats,
    }
}
