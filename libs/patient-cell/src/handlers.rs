use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateUserRequest, PatientError, RegisterPatientRequest};
use crate::services::PatientService;

fn map_patient_error(e: anyhow::Error) -> AppError {
    match e.downcast_ref::<PatientError>() {
        Some(PatientError::NotFound) => AppError::NotFound("Patient not found".to_string()),
        Some(PatientError::UserNotFound) => AppError::NotFound("User not found".to_string()),
        Some(PatientError::ValidationError(msg)) => AppError::ValidationError(msg.clone()),
        Some(PatientError::InvalidDocument(msg)) => {
            AppError::BadRequest(format!("Invalid identification document: {}", msg))
        }
        None => AppError::Internal(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn create_user(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("User {} creating portal account for {}", user.id, request.email);
    let service = PatientService::new(&config);

    let portal_user = service.create_user(request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(portal_user)))
}

#[axum::debug_handler]
pub async fn get_user(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let portal_user = service.get_user(&user_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(portal_user)))
}

#[axum::debug_handler]
pub async fn register_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.register_patient(request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient_by_user(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.get_patient_by_user(&user_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.find_patient(&id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}
