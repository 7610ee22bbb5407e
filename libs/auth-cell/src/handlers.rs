use std::sync::Arc;

use axum::{
    extract::{State, Json},
    http::HeaderMap,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::jwt;

#[derive(Debug, Deserialize)]
pub struct PasskeyRequest {
    pub passkey: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessKeyRequest {
    pub access_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PasskeyResponse {
    pub valid: bool,
    pub access_key: String,
}

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    let user = jwt::validate_token(&token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;
    let valid = jwt::validate_token(&token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

/// Exchanges the admin passkey for the access key the dashboard keeps
/// between visits.
pub async fn validate_admin_passkey(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<PasskeyRequest>,
) -> Result<Json<PasskeyResponse>, AppError> {
    if !config.is_admin_passkey_configured() {
        return Err(AppError::Internal("Admin passkey is not configured".to_string()));
    }

    if request.passkey != config.admin_passkey {
        warn!("Rejected admin passkey attempt");
        return Err(AppError::Auth("Invalid passkey. Please try again.".to_string()));
    }

    Ok(Json(PasskeyResponse {
        valid: true,
        access_key: STANDARD.encode(&request.passkey),
    }))
}

pub async fn verify_access_key(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<AccessKeyRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !config.is_admin_passkey_configured() {
        return Err(AppError::Internal("Admin passkey is not configured".to_string()));
    }

    let valid = STANDARD
        .decode(request.access_key.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .is_some_and(|decoded| decoded == config.admin_passkey);

    Ok(Json(json!({ "valid": valid })))
}
