use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, availability_routes, AppointmentState};
use appointment_cell::services::SchedulingEngine;
use barber_cell::router::{barber_routes, CatalogState};
use barber_cell::services::ScheduleCatalog;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>, engine: Arc<SchedulingEngine>, catalog: Arc<dyn ScheduleCatalog>) -> Router {
    let catalog_state = Arc::new(CatalogState {
        config: config.clone(),
        catalog,
    });
    let appointment_state = Arc::new(AppointmentState { config, engine });

    Router::new()
        .route("/", get(|| async { "Barbershop scheduling API is running!" }))
        .nest(
            "/barbers",
            barber_routes(catalog_state).merge(availability_routes(appointment_state.clone())),
        )
        .nest("/appointments", appointment_routes(appointment_state))
}
