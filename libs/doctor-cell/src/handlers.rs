use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Local, NaiveDate, NaiveDateTime};
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{
    AvailableSlotsResponse, CreateDoctorRequest, DoctorError, SelectableDatesResponse,
    UpdateDoctorRequest,
};
use crate::services::doctor::DoctorService;
use crate::services::slots::MAX_SELECTABLE_DAYS;

const DEFAULT_SELECTABLE_DAYS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    /// Overrides the server clock, mainly for callers in another zone.
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct SelectableDatesQuery {
    pub from: Option<NaiveDate>,
    pub days: Option<u32>,
    pub now: Option<NaiveDateTime>,
}

fn map_doctor_error(e: anyhow::Error) -> AppError {
    match e.downcast_ref::<DoctorError>() {
        Some(DoctorError::NotFound) => AppError::NotFound("Doctor not found".to_string()),
        Some(DoctorError::ValidationError(msg)) => AppError::ValidationError(msg.clone()),
        Some(DoctorError::InvalidImage(msg)) => AppError::BadRequest(format!("Invalid image upload: {}", msg)),
        None => AppError::Internal(e.to_string()),
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service.list_doctors(None).await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.get_doctor(&doctor_id, None).await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<AvailableSlotsResponse>, AppError> {
    let doctor_service = DoctorService::new(&state);
    let now = query.now.unwrap_or_else(|| Local::now().naive_local());

    let slots = doctor_service.available_slots(&doctor_id, query.date, now).await
        .map_err(map_doctor_error)?;

    Ok(Json(AvailableSlotsResponse {
        doctor_id,
        date: query.date,
        total_slots: slots.len(),
        slots,
    }))
}

#[axum::debug_handler]
pub async fn get_selectable_dates(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SelectableDatesQuery>,
) -> Result<Json<SelectableDatesResponse>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_SELECTABLE_DAYS);
    if days == 0 || days > MAX_SELECTABLE_DAYS {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_SELECTABLE_DAYS
        )));
    }

    let now = query.now.unwrap_or_else(|| Local::now().naive_local());
    let from = query.from.unwrap_or_else(|| now.date());

    let doctor_service = DoctorService::new(&state);
    let dates = doctor_service.selectable_dates(&doctor_id, from, days, now).await
        .map_err(map_doctor_error)?;

    Ok(Json(SelectableDatesResponse {
        doctor_id,
        from,
        days,
        dates,
    }))
}

// ==============================================================================
// ADMIN ROSTER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "create doctor profiles")?;

    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.create_doctor(request, auth.token()).await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "update doctor profiles")?;

    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.update_doctor(&doctor_id, request, auth.token()).await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "delete doctor profiles")?;

    let doctor_service = DoctorService::new(&state);

    let result = doctor_service.delete_doctor(&doctor_id, auth.token()).await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(result)))
}
