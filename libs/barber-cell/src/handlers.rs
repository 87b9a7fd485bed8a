// libs/barber-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::actor_from_user;

use crate::router::CatalogState;

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<CatalogState>>,
    Path(provider_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    debug!("Provider {} requested by {}", provider_id, actor.id);

    let provider = state
        .catalog
        .provider(provider_id)
        .await
        .ok_or_else(|| AppError::NotFound("Provider not found".to_string()))?;

    Ok(Json(json!(provider)))
}

#[axum::debug_handler]
pub async fn get_provider_services(
    State(state): State<Arc<CatalogState>>,
    Path(provider_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    actor_from_user(&user)?;

    let provider = state
        .catalog
        .provider(provider_id)
        .await
        .ok_or_else(|| AppError::NotFound("Provider not found".to_string()))?;

    Ok(Json(json!({
        "provider_id": provider.id,
        "services": provider.services,
    })))
}
