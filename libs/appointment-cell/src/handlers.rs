// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::actor_from_user;

use crate::models::{
    AppointmentListQuery, AppointmentStatus, AvailabilityQuery, BookingRequest, CreateBookingBody,
    UpdateStatusBody,
};
use crate::router::AppointmentState;

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppointmentState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    actor_from_user(&user)?;

    let slots = state
        .engine
        .get_availability(provider_id, query.date, query.service_id)
        .await?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "service_id": query.service_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len(),
    })))
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor = actor_from_user(&user)?;

    let request = BookingRequest {
        provider_id: body.provider_id,
        client_id: body.client_id.unwrap_or(actor.id),
        service_id: body.service_id,
        date: body.date,
        start: body.start,
        notes: body.notes,
    };

    let appointment = state.engine.create_booking(&actor, request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<AppointmentListQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let owner = query.owner()?;
    let filter = query.filter()?;

    let appointments = state.engine.list_appointments(&actor, owner, &filter).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let appointment = state.engine.get_appointment(&actor, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment_history(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let history = state.engine.history(&actor, appointment_id).await?;

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "history": history,
    })))
}

// ==============================================================================
// STATUS CHANGES
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let appointment = state.engine.cancel_booking(&actor, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let new_status: AppointmentStatus = body.status.parse()?;
    debug!("Status change to {} requested for {}", new_status, appointment_id);

    let appointment = state
        .engine
        .update_status(&actor, appointment_id, new_status)
        .await?;

    Ok(Json(json!(appointment)))
}
