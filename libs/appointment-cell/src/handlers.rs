// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{
    AppointmentAction, AppointmentError, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::{AnalyticsService, AppointmentService, ReportService, ReportUpload};

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub doctor: Option<String>,
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::InvalidAction(action) => {
            AppError::BadRequest(format!("Unknown appointment action: {}", action))
        }
        AppointmentError::InvalidStatusTransition { from, to } => {
            AppError::Conflict(format!("Cannot move a {} appointment to {}", from, to))
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::EmptyReport => AppError::BadRequest("No file provided".to_string()),
        AppointmentError::InvalidReports => AppError::BadRequest("Reports must be an array".to_string()),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        AppointmentError::StorageError(msg) => AppError::ExternalService(msg),
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_service = AppointmentService::new(&state);

    let appointment = appointment_service.create_appointment(request, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let appointment_service = AppointmentService::new(&state);

    let appointment = appointment_service.get_appointment(&appointment_id, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

/// Admin dashboard actions: `schedule`, `cancel` or `complete`.
#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path((appointment_id, action)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "update appointments")?;

    let action: AppointmentAction = action.parse().map_err(map_appointment_error)?;
    let appointment_service = AppointmentService::new(&state);

    let appointment = appointment_service
        .update_appointment(&appointment_id, action, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_recent_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "view all appointments")?;

    let appointment_service = AppointmentService::new(&state);

    let recent = appointment_service.get_recent_appointments(auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(recent)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let appointment_service = AppointmentService::new(&state);

    let appointments = appointment_service.get_appointments_by_patient(&patient_id, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointments_with_patients(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let appointment_service = AppointmentService::new(&state);

    let result = appointment_service.get_appointments_with_patient_info(&patient_id, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(result)))
}

// ==============================================================================
// REPORT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_reports(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let report_service = ReportService::new(&state);

    let reports = report_service.get_reports(&appointment_id, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "reports": reports })))
}

/// Multipart form with a `file` part and an optional `type` part.
#[axum::debug_handler]
pub async fn upload_report(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut upload: Option<ReportUpload> = None;
    let mut report_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("report").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

                upload = Some(ReportUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                    report_type: None,
                });
            }
            Some("type") => {
                report_type = Some(field.text().await
                    .map_err(|e| AppError::BadRequest(format!("Invalid report type: {}", e)))?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let mut upload = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    upload.report_type = report_type;

    let report_service = ReportService::new(&state);
    let reports = report_service.upload_report(&appointment_id, upload, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "reports": reports
    })))
}

#[axum::debug_handler]
pub async fn replace_reports(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let reports = body.get("reports").cloned().unwrap_or(Value::Null);

    let report_service = ReportService::new(&state);
    let reports = report_service.replace_reports(&appointment_id, reports, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "reports": reports
    })))
}

// ==============================================================================
// ANALYTICS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_analytics(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AnalyticsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "view analytics")?;

    let analytics_service = AnalyticsService::new(&state);

    let analytics = analytics_service.admin_analytics(query.doctor.as_deref(), auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(analytics)))
}
