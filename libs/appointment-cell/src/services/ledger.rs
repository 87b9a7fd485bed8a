// libs/appointment-cell/src/services/ledger.rs
use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::Actor;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, ListFilter, StatusChange};

#[derive(Default)]
struct LedgerInner {
    appointments: HashMap<Uuid, Appointment>,
    by_provider_date: BTreeMap<(Uuid, NaiveDate), Vec<Uuid>>,
    by_client: HashMap<Uuid, Vec<Uuid>>,
    history: HashMap<Uuid, Vec<StatusChange>>,
}

impl LedgerInner {
    fn collect<'a>(&self, ids: impl Iterator<Item = &'a Uuid>, filter: &ListFilter) -> Vec<Appointment> {
        let mut found: Vec<Appointment> = ids
            .filter_map(|id| self.appointments.get(id))
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();
        found.sort_by_key(|appointment| appointment.starts_at());
        found
    }
}

/// The system of record for appointments.
///
/// Indexed by (provider, date) so the hot overlap query never scans the
/// whole store. Records are only ever added or have their status changed.
#[derive(Default)]
pub struct BookingLedger {
    inner: RwLock<LedgerInner>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new appointment and opens its status log.
    pub async fn insert(&self, appointment: Appointment, actor: &Actor) -> Result<(), AppointmentError> {
        let mut inner = self.inner.write().await;

        if inner.appointments.contains_key(&appointment.id) {
            return Err(AppointmentError::InvalidRequest(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }

        let id = appointment.id;
        inner
            .by_provider_date
            .entry((appointment.provider_id, appointment.date))
            .or_default()
            .push(id);
        inner.by_client.entry(appointment.client_id).or_default().push(id);
        inner.history.insert(
            id,
            vec![StatusChange {
                appointment_id: id,
                from: None,
                to: appointment.status,
                actor_id: actor.id,
                actor_role: actor.role,
                at: appointment.created_at,
            }],
        );
        inner.appointments.insert(id, appointment);

        debug!("Appointment {} written to ledger", id);
        Ok(())
    }

    pub async fn get(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.inner.read().await.appointments.get(&appointment_id).cloned()
    }

    /// Applies a status change atomically. `decide` sees the current record
    /// under the write lock and returns the new status or an error; nothing
    /// else can touch the record in between. Returns the old and updated
    /// record.
    pub async fn update_status<F>(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
        decide: F,
    ) -> Result<(AppointmentStatus, Appointment), AppointmentError>
    where
        F: FnOnce(&Appointment) -> Result<AppointmentStatus, AppointmentError>,
    {
        let mut inner = self.inner.write().await;

        let appointment = inner
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| AppointmentError::NotFound(format!("Appointment {}", appointment_id)))?;

        let new_status = decide(appointment)?;
        let old_status = appointment.status;
        let now = Utc::now();

        appointment.status = new_status;
        appointment.updated_at = now;
        let updated = appointment.clone();

        inner.history.entry(appointment_id).or_default().push(StatusChange {
            appointment_id,
            from: Some(old_status),
            to: new_status,
            actor_id: actor.id,
            actor_role: actor.role,
            at: now,
        });

        debug!("Appointment {} moved {} -> {}", appointment_id, old_status, new_status);
        Ok((old_status, updated))
    }

    /// Appointments with `provider_id` on `date`, ordered by start time.
    /// `statuses` narrows the result when given.
    pub async fn list_by_provider_and_date(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        statuses: Option<&[AppointmentStatus]>,
    ) -> Vec<Appointment> {
        let inner = self.inner.read().await;
        let filter = ListFilter {
            from: None,
            to: None,
            statuses: statuses.map(<[AppointmentStatus]>::to_vec),
        };
        match inner.by_provider_date.get(&(provider_id, date)) {
            Some(ids) => inner.collect(ids.iter(), &filter),
            None => Vec::new(),
        }
    }

    /// Pending and confirmed appointments only.
    pub async fn active_for_provider_on(&self, provider_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        self.list_by_provider_and_date(provider_id, date, Some(&AppointmentStatus::ACTIVE[..]))
            .await
    }

    pub async fn list_by_provider(&self, provider_id: Uuid, filter: &ListFilter) -> Vec<Appointment> {
        let inner = self.inner.read().await;
        let from = filter.from.unwrap_or(NaiveDate::MIN);
        let to = filter.to.unwrap_or(NaiveDate::MAX);
        if from > to {
            return Vec::new();
        }

        let ids = inner
            .by_provider_date
            .range((provider_id, from)..=(provider_id, to))
            .flat_map(|(_, ids)| ids.iter());
        inner.collect(ids, filter)
    }

    pub async fn list_by_client(&self, client_id: Uuid, filter: &ListFilter) -> Vec<Appointment> {
        let inner = self.inner.read().await;
        match inner.by_client.get(&client_id) {
            Some(ids) => inner.collect(ids.iter(), filter),
            None => Vec::new(),
        }
    }

    /// Status log of one appointment, oldest first.
    pub async fn history(&self, appointment_id: Uuid) -> Option<Vec<StatusChange>> {
        self.inner.read().await.history.get(&appointment_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.appointments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
