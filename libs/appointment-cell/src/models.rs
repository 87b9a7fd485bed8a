// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::ActorRole;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start: NaiveTime,
    /// Copied from the service at booking time.
    pub duration_minutes: u32,
    /// Copied from the service at booking time.
    pub price_cents: u64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(self.duration_minutes as i64)
    }

    /// Half-open interval overlap against `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.starts_at() < end && start < self.ends_at()
    }

    pub fn occupies_slot(&self) -> bool {
        self.status.occupies_slot()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 2] = [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow
        )
    }

    /// Only pending and confirmed appointments take part in overlap checks.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            "no_show" | "noshow" => Ok(AppointmentStatus::NoShow),
            other => Err(AppointmentError::InvalidRequest(format!("Unknown status: {}", other))),
        }
    }
}

/// A status change an actor may request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Confirm,
    Cancel,
    Complete,
    MarkNoShow,
}

impl Transition {
    pub fn target(&self) -> AppointmentStatus {
        match self {
            Transition::Confirm => AppointmentStatus::Confirmed,
            Transition::Cancel => AppointmentStatus::Cancelled,
            Transition::Complete => AppointmentStatus::Completed,
            Transition::MarkNoShow => AppointmentStatus::NoShow,
        }
    }

    /// The transition that lands in `status`, if any does.
    pub fn landing_in(status: AppointmentStatus) -> Option<Transition> {
        match status {
            AppointmentStatus::Confirmed => Some(Transition::Confirm),
            AppointmentStatus::Cancelled => Some(Transition::Cancel),
            AppointmentStatus::Completed => Some(Transition::Complete),
            AppointmentStatus::NoShow => Some(Transition::MarkNoShow),
            AppointmentStatus::Pending => None,
        }
    }
}

/// A candidate booking opportunity. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

/// One entry of an appointment's append-only status log. The first entry
/// of every appointment has no `from` status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    pub appointment_id: Uuid,
    pub from: Option<AppointmentStatus>,
    pub to: AppointmentStatus,
    pub actor_id: Uuid,
    pub actor_role: ActorRole,
    pub at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub notes: Option<String>,
}

/// Body of `POST /appointments`. The client defaults to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingBody {
    pub provider_id: Uuid,
    pub client_id: Option<Uuid>,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusBody {
    /// Parsed with `AppointmentStatus::from_str` so unknown values surface
    /// as a bad request.
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub service_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub provider_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Comma separated, e.g. `pending,confirmed`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentOwner {
    Provider(Uuid),
    Client(Uuid),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub statuses: Option<Vec<AppointmentStatus>>,
}

impl ListFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.from.map_or(true, |from| appointment.date >= from)
            && self.to.map_or(true, |to| appointment.date <= to)
            && self
                .statuses
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&appointment.status))
    }
}

impl AppointmentListQuery {
    pub fn owner(&self) -> Result<AppointmentOwner, AppointmentError> {
        match (self.provider_id, self.client_id) {
            (Some(provider_id), None) => Ok(AppointmentOwner::Provider(provider_id)),
            (None, Some(client_id)) => Ok(AppointmentOwner::Client(client_id)),
            _ => Err(AppointmentError::InvalidRequest(
                "Exactly one of provider_id or client_id is required".to_string(),
            )),
        }
    }

    pub fn filter(&self) -> Result<ListFilter, AppointmentError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppointmentError::InvalidRequest(
                    "from must not be after to".to_string(),
                ));
            }
        }

        let statuses = match self.status.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.split(',')
                    .map(str::parse)
                    .collect::<Result<Vec<AppointmentStatus>, _>>()?,
            ),
            _ => None,
        };

        Ok(ListFilter {
            from: self.from,
            to: self.to,
            statuses,
        })
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider closed: {0}")]
    ProviderClosed(String),

    #[error("Requested slot is no longer available")]
    SlotConflict,

    #[error("Cancellation window has expired")]
    CancellationWindowExpired,

    #[error("Cannot move appointment from {from} to {to}: {reason}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
        reason: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Timed out waiting for the booking lock")]
    LockTimeout,
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        let message = error.to_string();
        match error {
            AppointmentError::InvalidRequest(_) => AppError::BadRequest(message),
            AppointmentError::ProviderClosed(_) => AppError::Unprocessable(message),
            AppointmentError::SlotConflict
            | AppointmentError::CancellationWindowExpired
            | AppointmentError::InvalidTransition { .. } => AppError::Conflict(message),
            AppointmentError::NotFound(_) => AppError::NotFound(message),
            AppointmentError::Forbidden(_) => AppError::Forbidden(message),
            AppointmentError::LockTimeout => AppError::Unavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(start: (u32, u32), minutes: u32) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            duration_minutes: minutes,
            price_cents: 0,
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        let booked = appointment((10, 0), 30);
        let date = booked.date;
        let at = |h, m| date.and_hms_opt(h, m, 0).unwrap();

        assert!(!booked.overlaps(at(9, 30), at(10, 0)));
        assert!(!booked.overlaps(at(10, 30), at(11, 0)));
        assert!(booked.overlaps(at(10, 15), at(10, 45)));
        assert!(booked.overlaps(at(9, 45), at(10, 15)));
    }

    #[test]
    fn status_parsing_and_terminality() {
        assert_eq!("no_show".parse::<AppointmentStatus>(), Ok(AppointmentStatus::NoShow));
        assert_eq!(" Confirmed".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Confirmed));
        assert!("rescheduled".parse::<AppointmentStatus>().is_err());

        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(!AppointmentStatus::Completed.occupies_slot());
        assert!(AppointmentStatus::Pending.occupies_slot());
    }

    #[test]
    fn list_query_requires_exactly_one_owner() {
        let mut query = AppointmentListQuery {
            provider_id: None,
            client_id: None,
            from: None,
            to: None,
            status: Some("pending,confirmed".to_string()),
        };
        assert!(query.owner().is_err());

        query.client_id = Some(Uuid::new_v4());
        assert!(matches!(query.owner(), Ok(AppointmentOwner::Client(_))));
        assert_eq!(
            query.filter().unwrap().statuses,
            Some(AppointmentStatus::ACTIVE.to_vec())
        );
    }

    #[test]
    fn errors_map_to_http_statuses() {
        use axum::http::StatusCode;

        let cases = [
            (AppointmentError::SlotConflict, StatusCode::CONFLICT),
            (AppointmentError::ProviderClosed("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppointmentError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppointmentError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppointmentError::LockTimeout, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }
}
