// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/recent", get(handlers::get_recent_appointments)) // Admin only
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/{action}", patch(handlers::update_appointment)) // Admin only

        // Patient listings
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/patients/{patient_id}/with-patients", get(handlers::get_appointments_with_patients))

        // Medical reports
        .route(
            "/{appointment_id}/reports",
            get(handlers::get_reports)
                .post(handlers::upload_report)
                .put(handlers::replace_reports),
        )

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

pub fn analytics_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::get_analytics)) // Admin only
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
