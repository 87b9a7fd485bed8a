// libs/barber-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::ScheduleCatalog;

pub struct CatalogState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn ScheduleCatalog>,
}

pub fn barber_routes(state: Arc<CatalogState>) -> Router {
    let protected_routes = Router::new()
        .route("/{provider_id}", get(handlers::get_provider))
        .route("/{provider_id}/services", get(handlers::get_provider_services))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
