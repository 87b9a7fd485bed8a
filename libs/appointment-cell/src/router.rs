// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::SchedulingEngine;

pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<SchedulingEngine>,
}

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_booking).get(handlers::list_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{appointment_id}/history", get(handlers::get_appointment_history))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

/// Mounted under `/barbers` next to the catalog routes.
pub fn availability_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/{provider_id}/availability", get(handlers::get_availability))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
