// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;
use uuid::Uuid;

use barber_cell::models::{Provider, Service, WorkingHours};
use barber_cell::services::ScheduleCatalog;
use shared_config::SchedulingPolicy;
use shared_utils::clock::Clock;

use crate::models::{Appointment, AppointmentError, Slot};

use super::ledger::BookingLedger;

/// Enumerates bookable start times for one day.
///
/// Candidates start at opening time and step by `granularity_minutes`. A
/// candidate survives when the whole service fits before closing, it does
/// not overlap any of `booked`, and it starts strictly after `earliest`.
pub fn compute_slots(
    hours: &WorkingHours,
    date: NaiveDate,
    duration_minutes: u32,
    granularity_minutes: u32,
    booked: &[Appointment],
    earliest: NaiveDateTime,
) -> Vec<Slot> {
    if !hours.is_open || duration_minutes == 0 || granularity_minutes == 0 {
        return Vec::new();
    }

    let close = hours.closes_at(date);
    let duration = Duration::minutes(duration_minutes as i64);
    let step = Duration::minutes(granularity_minutes as i64);

    let mut slots = Vec::new();
    let mut current = hours.opens_at(date);

    // Checked arithmetic: dates at the edge of the calendar would overflow.
    while let Some(end) = current.checked_add_signed(duration).filter(|end| *end <= close) {
        let taken = booked
            .iter()
            .any(|appointment| appointment.occupies_slot() && appointment.overlaps(current, end));

        if current > earliest && !taken {
            slots.push(Slot {
                date,
                start: current.time(),
                duration_minutes,
            });
        }

        current = match current.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }

    slots
}

/// Provider and service resolved for a booking or availability query.
pub(crate) struct ResolvedOffer {
    pub provider: Provider,
    pub service: Service,
}

/// Looks up provider and service and checks the service belongs to the
/// provider.
pub(crate) async fn resolve_offer(
    catalog: &dyn ScheduleCatalog,
    provider_id: Uuid,
    service_id: Uuid,
) -> Result<ResolvedOffer, AppointmentError> {
    let provider = catalog
        .provider(provider_id)
        .await
        .ok_or_else(|| AppointmentError::NotFound(format!("Provider {}", provider_id)))?;

    let service = catalog
        .service(service_id)
        .await
        .ok_or_else(|| AppointmentError::NotFound(format!("Service {}", service_id)))?;

    if service.provider_id != provider.id {
        return Err(AppointmentError::InvalidRequest(format!(
            "Service {} is not offered by provider {}",
            service_id, provider_id
        )));
    }

    Ok(ResolvedOffer { provider, service })
}

pub struct AvailabilityService {
    catalog: Arc<dyn ScheduleCatalog>,
    ledger: Arc<BookingLedger>,
    clock: Arc<dyn Clock>,
    policy: SchedulingPolicy,
}

impl AvailabilityService {
    pub fn new(
        catalog: Arc<dyn ScheduleCatalog>,
        ledger: Arc<BookingLedger>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            catalog,
            ledger,
            clock,
            policy,
        }
    }

    /// Free slots for `service_id` with `provider_id` on `date`, ascending.
    /// Closed days and past dates yield an empty list.
    pub async fn get_availability(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        service_id: Uuid,
    ) -> Result<Vec<Slot>, AppointmentError> {
        let ResolvedOffer { provider, service } =
            resolve_offer(self.catalog.as_ref(), provider_id, service_id).await?;

        let now = self.clock.now();
        if date < now.date() {
            debug!("Availability requested for past date {}", date);
            return Ok(Vec::new());
        }

        let hours = match provider.open_hours_on(date) {
            Some(hours) => hours,
            None => {
                debug!("Provider {} is closed on {}", provider_id, date);
                return Ok(Vec::new());
            }
        };

        let booked = self.ledger.active_for_provider_on(provider_id, date).await;
        let earliest = now + Duration::minutes(self.policy.min_lead_time_minutes as i64);

        let slots = compute_slots(
            hours,
            date,
            service.duration_minutes,
            provider.granularity_minutes(self.policy.slot_granularity_minutes),
            &booked,
            earliest,
        );

        debug!(
            "Computed {} slots for provider {} on {} ({} booked)",
            slots.len(),
            provider_id,
            date,
            booked.len()
        );
        Ok(slots)
    }
}
