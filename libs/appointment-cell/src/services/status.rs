// libs/appointment-cell/src/services/status.rs
use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_utils::clock::Clock;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

use super::events::{emit, BookingEvent, EventSink};
use super::ledger::BookingLedger;
use super::lifecycle::AppointmentLifecycleService;

/// Applies status transitions. The legality check and the write happen
/// under a single ledger lock, so two racing transitions on the same
/// appointment cannot both succeed.
pub struct StatusService {
    ledger: Arc<BookingLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    lifecycle: AppointmentLifecycleService,
}

impl StatusService {
    pub fn new(
        ledger: Arc<BookingLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        lifecycle: AppointmentLifecycleService,
    ) -> Self {
        Self {
            ledger,
            clock,
            events,
            lifecycle,
        }
    }

    pub async fn cancel_booking(&self, actor: &Actor, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.update_status(actor, appointment_id, AppointmentStatus::Cancelled).await
    }

    #[instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let now = self.clock.now();
        let lifecycle = &self.lifecycle;

        let (old_status, appointment) = self
            .ledger
            .update_status(appointment_id, actor, |current| {
                lifecycle
                    .check_transition(actor, current, new_status, now)
                    .map(|transition| transition.target())
            })
            .await?;

        info!(
            "Appointment {} moved from {} to {} by {} {}",
            appointment_id, old_status, new_status, actor.role, actor.id
        );

        emit(
            self.events.as_ref(),
            BookingEvent::StatusChanged {
                appointment: appointment.clone(),
                old_status,
                new_status,
                actor: *actor,
            },
        );

        Ok(appointment)
    }

    pub fn lifecycle(&self) -> &AppointmentLifecycleService {
        &self.lifecycle
    }
}
