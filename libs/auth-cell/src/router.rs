use std::sync::Arc;

use axum::{
    Router,
    routing::post,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/validate", post(handlers::validate_token))
        .route("/verify", post(handlers::verify_token))
        .route("/admin/passkey", post(handlers::validate_admin_passkey))
        .route("/admin/access-key", post(handlers::verify_access_key))
        .with_state(state)
}
