// libs/barber-cell/src/models.rs
use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub working_hours: Vec<WorkingHours>,
    #[serde(default)]
    pub services: Vec<Service>,
    /// Overrides the system-wide slot step for this provider.
    #[serde(default)]
    pub slot_granularity_minutes: Option<u32>,
}

impl Provider {
    pub fn hours_for(&self, weekday: Weekday) -> Option<&WorkingHours> {
        self.working_hours.iter().find(|hours| hours.weekday == weekday)
    }

    /// Working hours for the weekday of `date`, only if the shop is open.
    pub fn open_hours_on(&self, date: NaiveDate) -> Option<&WorkingHours> {
        self.hours_for(date.weekday()).filter(|hours| hours.is_open)
    }

    pub fn service(&self, service_id: Uuid) -> Option<&Service> {
        self.services.iter().find(|service| service.id == service_id)
    }

    pub fn offers(&self, service_id: Uuid) -> bool {
        self.service(service_id).is_some()
    }

    pub fn granularity_minutes(&self, system_default: u32) -> u32 {
        self.slot_granularity_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(system_default)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_days = HashSet::new();
        for hours in &self.working_hours {
            if !seen_days.insert(hours.weekday) {
                return Err(CatalogError::InvalidWorkingHours {
                    provider_id: self.id,
                    reason: format!("duplicate entry for {}", hours.weekday),
                });
            }
            if hours.is_open && hours.start >= hours.end {
                return Err(CatalogError::InvalidWorkingHours {
                    provider_id: self.id,
                    reason: format!(
                        "{} opens at {} but closes at {}",
                        hours.weekday, hours.start, hours.end
                    ),
                });
            }
        }

        if self.slot_granularity_minutes == Some(0) {
            return Err(CatalogError::InvalidWorkingHours {
                provider_id: self.id,
                reason: "slot granularity must be positive".to_string(),
            });
        }

        let mut seen_services = HashSet::new();
        for service in &self.services {
            if !seen_services.insert(service.id) {
                return Err(CatalogError::InvalidService {
                    service_id: service.id,
                    reason: "listed twice".to_string(),
                });
            }
            service.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_open: bool,
}

impl WorkingHours {
    pub fn open(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { weekday, start, end, is_open: true }
    }

    pub fn closed(weekday: Weekday) -> Self {
        Self {
            weekday,
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
            is_open: false,
        }
    }

    pub fn opens_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    pub fn closes_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.end)
    }

    /// Whether `[start, end)` on `date` sits inside opening hours. The end
    /// may coincide with closing time.
    pub fn covers(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.is_open && start >= self.opens_at(date) && end <= self.closes_at(date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: Uuid,
    /// Filled in from the owning provider when the catalog is loaded.
    #[serde(default)]
    pub provider_id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub price_cents: u64,
}

impl Service {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.duration_minutes == 0 {
            return Err(CatalogError::InvalidService {
                service_id: self.id,
                reason: "duration must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// On-disk shape of the profile collaborator's export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub providers: Vec<Provider>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid working hours for provider {provider_id}: {reason}")]
    InvalidWorkingHours { provider_id: Uuid, reason: String },

    #[error("Invalid service {service_id}: {reason}")]
    InvalidService { service_id: Uuid, reason: String },

    #[error("Service {service_id} already belongs to provider {owner_id}")]
    ServiceOwnedElsewhere { service_id: Uuid, owner_id: Uuid },

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn provider(hours: Vec<WorkingHours>) -> Provider {
        Provider {
            id: Uuid::new_v4(),
            name: "Test Barber".to_string(),
            working_hours: hours,
            services: vec![],
            slot_granularity_minutes: None,
        }
    }

    #[test]
    fn open_day_requires_start_before_end() {
        let bad = provider(vec![WorkingHours::open(Weekday::Mon, t(12, 0), t(9, 0))]);
        assert!(matches!(bad.validate(), Err(CatalogError::InvalidWorkingHours { .. })));

        let closed = provider(vec![WorkingHours::closed(Weekday::Sun)]);
        assert!(closed.validate().is_ok());
    }

    #[test]
    fn duplicate_weekday_is_rejected() {
        let dup = provider(vec![
            WorkingHours::open(Weekday::Mon, t(9, 0), t(12, 0)),
            WorkingHours::open(Weekday::Mon, t(13, 0), t(17, 0)),
        ]);
        assert!(dup.validate().is_err());
    }

    #[test]
    fn covers_allows_ending_exactly_at_close() {
        let hours = WorkingHours::open(Weekday::Mon, t(9, 0), t(12, 0));
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        assert!(hours.covers(date, date.and_time(t(11, 30)), date.and_time(t(12, 0))));
        assert!(!hours.covers(date, date.and_time(t(11, 31)), date.and_time(t(12, 1))));
        assert!(!hours.covers(date, date.and_time(t(8, 59)), date.and_time(t(9, 29))));
    }

    #[test]
    fn provider_granularity_overrides_default() {
        let mut p = provider(vec![]);
        assert_eq!(p.granularity_minutes(15), 15);
        p.slot_granularity_minutes = Some(30);
        assert_eq!(p.granularity_minutes(15), 30);
    }
}
