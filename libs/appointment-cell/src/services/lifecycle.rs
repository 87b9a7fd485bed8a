// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use shared_models::auth::{Actor, ActorRole};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, Transition};

/// Which role may trigger which transition.
const PERMISSIONS: &[(ActorRole, &[Transition])] = &[
    (ActorRole::Client, &[Transition::Cancel]),
    (
        ActorRole::Provider,
        &[Transition::Confirm, Transition::Cancel, Transition::Complete, Transition::MarkNoShow],
    ),
    (
        ActorRole::Admin,
        &[Transition::Confirm, Transition::Cancel, Transition::Complete, Transition::MarkNoShow],
    ),
];

/// Pure rules of the appointment status state machine. Holds no state;
/// callers supply the appointment, the actor and "now".
#[derive(Debug, Clone, Default)]
pub struct AppointmentLifecycleService {
    cancellation_cutoff: Duration,
}

impl AppointmentLifecycleService {
    pub fn new(cancellation_cutoff_minutes: u32) -> Self {
        Self {
            cancellation_cutoff: Duration::minutes(cancellation_cutoff_minutes as i64),
        }
    }

    /// All valid next statuses for a given current status.
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
                AppointmentStatus::NoShow,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow => &[],
        }
    }

    pub fn is_permitted(&self, role: ActorRole, transition: Transition) -> bool {
        PERMISSIONS
            .iter()
            .find(|(candidate, _)| *candidate == role)
            .map_or(false, |(_, allowed)| allowed.contains(&transition))
    }

    /// Clients act on their own bookings, providers on bookings made with
    /// them, admins on everything.
    pub fn ensure_owner(&self, actor: &Actor, appointment: &Appointment) -> Result<(), AppointmentError> {
        let owns = match actor.role {
            ActorRole::Admin => true,
            ActorRole::Client => appointment.client_id == actor.id,
            ActorRole::Provider => appointment.provider_id == actor.id,
        };

        if owns {
            Ok(())
        } else {
            warn!("Actor {} ({}) denied access to appointment {}", actor.id, actor.role, appointment.id);
            Err(AppointmentError::Forbidden("Appointment belongs to someone else".to_string()))
        }
    }

    /// Decides whether `actor` may move `appointment` to `new_status` at
    /// `now`. Returns the transition on success.
    pub fn check_transition(
        &self,
        actor: &Actor,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> Result<Transition, AppointmentError> {
        let current_status = appointment.status;
        debug!("Validating status transition {} -> {} for {}", current_status, new_status, appointment.id);

        self.ensure_owner(actor, appointment)?;

        if current_status.is_terminal() {
            return Err(self.invalid(current_status, new_status, "appointment is already closed"));
        }

        let transition = Transition::landing_in(new_status)
            .ok_or_else(|| self.invalid(current_status, new_status, "appointments cannot return to pending"))?;

        if !self.is_permitted(actor.role, transition) {
            return Err(AppointmentError::Forbidden(format!(
                "{} may not move an appointment to {}",
                actor.role, new_status
            )));
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(self.invalid(current_status, new_status, "transition is not allowed"));
        }

        self.check_timing(appointment, transition, now)?;

        Ok(transition)
    }

    fn check_timing(
        &self,
        appointment: &Appointment,
        transition: Transition,
        now: NaiveDateTime,
    ) -> Result<(), AppointmentError> {
        match transition {
            Transition::Confirm => Ok(()),
            Transition::Cancel => {
                if now < appointment.starts_at() - self.cancellation_cutoff {
                    Ok(())
                } else {
                    Err(AppointmentError::CancellationWindowExpired)
                }
            }
            Transition::Complete => {
                if now >= appointment.ends_at() {
                    Ok(())
                } else {
                    Err(self.invalid(appointment.status, transition.target(), "appointment has not ended yet"))
                }
            }
            Transition::MarkNoShow => {
                if now >= appointment.starts_at() {
                    Ok(())
                } else {
                    Err(self.invalid(appointment.status, transition.target(), "appointment has not started yet"))
                }
            }
        }
    }

    fn invalid(&self, from: AppointmentStatus, to: AppointmentStatus, reason: &str) -> AppointmentError {
        AppointmentError::InvalidTransition {
            from,
            to,
            reason: reason.to_string(),
        }
    }
}
