// libs/appointment-cell/src/services/engine.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use barber_cell::services::ScheduleCatalog;
use shared_config::SchedulingPolicy;
use shared_models::auth::{Actor, ActorRole};
use shared_utils::clock::Clock;

use crate::models::{
    Appointment, AppointmentError, AppointmentOwner, AppointmentStatus, BookingRequest, ListFilter, Slot,
    StatusChange,
};

use super::availability::AvailabilityService;
use super::booking::BookingCoordinator;
use super::events::EventSink;
use super::ledger::BookingLedger;
use super::lifecycle::AppointmentLifecycleService;
use super::status::StatusService;

/// Single entry point for everything the HTTP layer needs. All services
/// share one ledger, one clock and one event sink.
pub struct SchedulingEngine {
    ledger: Arc<BookingLedger>,
    availability: AvailabilityService,
    coordinator: BookingCoordinator,
    status: StatusService,
}

impl SchedulingEngine {
    pub fn new(
        catalog: Arc<dyn ScheduleCatalog>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self::with_ledger(Arc::new(BookingLedger::new()), catalog, clock, events, policy)
    }

    pub fn with_ledger(
        ledger: Arc<BookingLedger>,
        catalog: Arc<dyn ScheduleCatalog>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        policy: SchedulingPolicy,
    ) -> Self {
        let availability = AvailabilityService::new(catalog.clone(), ledger.clone(), clock.clone(), policy.clone());
        let coordinator =
            BookingCoordinator::new(catalog, ledger.clone(), clock.clone(), events.clone(), policy.clone());
        let status = StatusService::new(
            ledger.clone(),
            clock,
            events,
            AppointmentLifecycleService::new(policy.cancellation_cutoff_minutes),
        );

        Self {
            ledger,
            availability,
            coordinator,
            status,
        }
    }

    pub async fn get_availability(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        service_id: Uuid,
    ) -> Result<Vec<Slot>, AppointmentError> {
        self.availability.get_availability(provider_id, date, service_id).await
    }

    pub async fn create_booking(&self, actor: &Actor, request: BookingRequest) -> Result<Appointment, AppointmentError> {
        self.coordinator.create_booking(actor, request).await
    }

    pub async fn cancel_booking(&self, actor: &Actor, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.status.cancel_booking(actor, appointment_id).await
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.status.update_status(actor, appointment_id, new_status).await
    }

    pub async fn get_appointment(&self, actor: &Actor, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .ledger
            .get(appointment_id)
            .await
            .ok_or_else(|| AppointmentError::NotFound(format!("Appointment {}", appointment_id)))?;

        self.status.lifecycle().ensure_owner(actor, &appointment)?;
        Ok(appointment)
    }

    pub async fn history(&self, actor: &Actor, appointment_id: Uuid) -> Result<Vec<StatusChange>, AppointmentError> {
        self.get_appointment(actor, appointment_id).await?;

        Ok(self.ledger.history(appointment_id).await.unwrap_or_default())
    }

    pub async fn list_appointments(
        &self,
        actor: &Actor,
        owner: AppointmentOwner,
        filter: &ListFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let allowed = match (actor.role, owner) {
            (ActorRole::Admin, _) => true,
            (ActorRole::Client, AppointmentOwner::Client(client_id)) => client_id == actor.id,
            (ActorRole::Provider, AppointmentOwner::Provider(provider_id)) => provider_id == actor.id,
            _ => false,
        };
        if !allowed {
            return Err(AppointmentError::Forbidden(
                "Cannot list appointments belonging to someone else".to_string(),
            ));
        }

        let appointments = match owner {
            AppointmentOwner::Provider(provider_id) => self.ledger.list_by_provider(provider_id, filter).await,
            AppointmentOwner::Client(client_id) => self.ledger.list_by_client(client_id, filter).await,
        };

        debug!("Listed {} appointments for {:?}", appointments.len(), owner);
        Ok(appointments)
    }

    pub fn ledger(&self) -> &Arc<BookingLedger> {
        &self.ledger
    }

    pub fn tracked_lock_keys(&self) -> usize {
        self.coordinator.tracked_lock_keys()
    }
}
