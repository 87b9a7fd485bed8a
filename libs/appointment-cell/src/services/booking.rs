// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use barber_cell::services::ScheduleCatalog;
use shared_config::SchedulingPolicy;
use shared_models::auth::{Actor, ActorRole};
use shared_utils::clock::Clock;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookingRequest};

use super::availability::{resolve_offer, ResolvedOffer};
use super::events::{emit, BookingEvent, EventSink};
use super::ledger::BookingLedger;

type LockKey = (Uuid, NaiveDate);

/// One async mutex per (provider, date). Bookings for different keys
/// never wait on each other.
#[derive(Default)]
pub struct BookingLocks {
    locks: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `timeout` for exclusive access to `key`.
    pub async fn acquire(&self, key: LockKey, timeout: StdDuration) -> Result<OwnedMutexGuard<()>, AppointmentError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key).or_default().clone()
        };

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!("Timed out after {:?} waiting for booking lock {:?}", timeout, key);
                Err(AppointmentError::LockTimeout)
            }
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

/// Validates booking requests and commits them to the ledger, one
/// (provider, date) at a time.
pub struct BookingCoordinator {
    catalog: Arc<dyn ScheduleCatalog>,
    ledger: Arc<BookingLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    policy: SchedulingPolicy,
    locks: BookingLocks,
}

impl BookingCoordinator {
    pub fn new(
        catalog: Arc<dyn ScheduleCatalog>,
        ledger: Arc<BookingLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            catalog,
            ledger,
            clock,
            events,
            policy,
            locks: BookingLocks::new(),
        }
    }

    #[instrument(skip(self, request), fields(actor_id = %actor.id, provider_id = %request.provider_id))]
    pub async fn create_booking(&self, actor: &Actor, request: BookingRequest) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking request from {} for provider {} on {} at {}",
            actor.id, request.provider_id, request.date, request.start
        );

        self.authorize(actor, &request)?;

        let ResolvedOffer { provider, service } =
            resolve_offer(self.catalog.as_ref(), request.provider_id, request.service_id).await?;

        let now = self.clock.now();
        if request.date < now.date() {
            return Err(AppointmentError::InvalidRequest(format!(
                "Date {} is in the past",
                request.date
            )));
        }

        let hours = provider.open_hours_on(request.date).ok_or_else(|| {
            AppointmentError::ProviderClosed(format!("Provider is closed on {}", request.date.format("%A")))
        })?;

        let starts_at = request.date.and_time(request.start);
        let ends_at = starts_at
            .checked_add_signed(Duration::minutes(service.duration_minutes as i64))
            .ok_or_else(|| {
                AppointmentError::InvalidRequest(format!("Date {} is out of range", request.date))
            })?;

        if !hours.covers(request.date, starts_at, ends_at) {
            return Err(AppointmentError::ProviderClosed(format!(
                "{} to {} falls outside opening hours {} to {}",
                starts_at.time(),
                ends_at.time(),
                hours.start,
                hours.end
            )));
        }

        let granularity = provider.granularity_minutes(self.policy.slot_granularity_minutes) as i64;
        let offset = (starts_at - hours.opens_at(request.date)).num_seconds();
        if offset % (granularity * 60) != 0 {
            return Err(AppointmentError::InvalidRequest(format!(
                "Start time {} is not on the {} minute grid",
                request.start, granularity
            )));
        }

        let earliest = now + Duration::minutes(self.policy.min_lead_time_minutes as i64);
        if starts_at <= earliest {
            return Err(AppointmentError::InvalidRequest(format!(
                "Start time must be after {}",
                earliest
            )));
        }

        let timeout = StdDuration::from_millis(self.policy.booking_lock_timeout_ms);
        let guard = self.locks.acquire((provider.id, request.date), timeout).await?;

        // Re-read under the lock so a booking committed while we waited
        // is visible.
        let booked = self.ledger.active_for_provider_on(provider.id, request.date).await;
        if let Some(existing) = booked.iter().find(|a| a.overlaps(starts_at, ends_at)) {
            warn!(
                "Slot conflict for provider {} at {}: overlaps appointment {}",
                provider.id, starts_at, existing.id
            );
            return Err(AppointmentError::SlotConflict);
        }

        let status = if self.policy.auto_confirm {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Pending
        };
        let stamp = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            provider_id: provider.id,
            client_id: request.client_id,
            service_id: service.id,
            date: request.date,
            start: request.start,
            duration_minutes: service.duration_minutes,
            price_cents: service.price_cents,
            status,
            notes: request.notes,
            created_at: stamp,
            updated_at: stamp,
        };

        self.ledger.insert(appointment.clone(), actor).await?;
        drop(guard);

        info!("Appointment {} booked with provider {}", appointment.id, appointment.provider_id);
        emit(
            self.events.as_ref(),
            BookingEvent::Created {
                appointment: appointment.clone(),
            },
        );

        Ok(appointment)
    }

    fn authorize(&self, actor: &Actor, request: &BookingRequest) -> Result<(), AppointmentError> {
        let allowed = match actor.role {
            ActorRole::Admin => true,
            ActorRole::Client => request.client_id == actor.id,
            ActorRole::Provider => request.provider_id == actor.id,
        };

        if allowed {
            Ok(())
        } else {
            debug!("{} {} may not book on behalf of {}", actor.role, actor.id, request.client_id);
            Err(AppointmentError::Forbidden(
                "Cannot book on behalf of another client or provider".to_string(),
            ))
        }
    }

    pub fn tracked_lock_keys(&self) -> usize {
        self.locks.tracked_keys()
    }
}
