#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use uuid::Uuid;

use appointment_cell::models::BookingRequest;
use appointment_cell::services::{EventSink, NoopEventSink, SchedulingEngine};
use barber_cell::models::{Provider, Service, WorkingHours};
use barber_cell::services::InMemoryScheduleCatalog;
use shared_config::SchedulingPolicy;
use shared_models::auth::{Actor, ActorRole};
use shared_utils::clock::FixedClock;

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 2030-01-07 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

pub fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_time(t(h, m))
}

pub struct Shop {
    pub engine: Arc<SchedulingEngine>,
    pub catalog: Arc<InMemoryScheduleCatalog>,
    pub clock: Arc<FixedClock>,
    pub provider: Provider,
    pub haircut: Service,
    pub long_cut: Service,
}

impl Shop {
    pub async fn new() -> Self {
        Self::build(test_policy(), Arc::new(NoopEventSink)).await
    }

    pub async fn with_policy(policy: SchedulingPolicy) -> Self {
        Self::build(policy, Arc::new(NoopEventSink)).await
    }

    /// Monday 09:00-12:00 on a 30 minute grid, closed Sundays. The clock
    /// starts at 08:00 on that Monday.
    pub async fn build(policy: SchedulingPolicy, events: Arc<dyn EventSink>) -> Self {
        let provider_id = Uuid::new_v4();
        let haircut = Service {
            id: Uuid::new_v4(),
            provider_id,
            name: "Haircut".to_string(),
            duration_minutes: 30,
            price_cents: 2500,
        };
        let long_cut = Service {
            id: Uuid::new_v4(),
            provider_id,
            name: "Cut and beard".to_string(),
            duration_minutes: 60,
            price_cents: 4000,
        };
        let provider = Provider {
            id: provider_id,
            name: "Sam the Barber".to_string(),
            working_hours: vec![
                WorkingHours::open(Weekday::Mon, t(9, 0), t(12, 0)),
                WorkingHours::open(Weekday::Tue, t(9, 0), t(17, 0)),
                WorkingHours::closed(Weekday::Sun),
            ],
            services: vec![haircut.clone(), long_cut.clone()],
            slot_granularity_minutes: Some(30),
        };

        let catalog = Arc::new(InMemoryScheduleCatalog::new());
        catalog.upsert_provider(provider.clone()).await.unwrap();

        let clock = Arc::new(FixedClock::new(at(monday(), 8, 0)));
        let engine = Arc::new(SchedulingEngine::new(catalog.clone(), clock.clone(), events, policy));

        Self {
            engine,
            catalog,
            clock,
            provider,
            haircut,
            long_cut,
        }
    }

    pub fn provider_actor(&self) -> Actor {
        Actor::new(self.provider.id, ActorRole::Provider)
    }

    pub fn request(&self, client_id: Uuid, service: &Service, date: NaiveDate, start: NaiveTime) -> BookingRequest {
        BookingRequest {
            provider_id: self.provider.id,
            client_id,
            service_id: service.id,
            date,
            start,
            notes: None,
        }
    }
}

pub fn test_policy() -> SchedulingPolicy {
    SchedulingPolicy {
        slot_granularity_minutes: 15,
        min_lead_time_minutes: 0,
        cancellation_cutoff_minutes: 0,
        auto_confirm: false,
        booking_lock_timeout_ms: 2_000,
        utc_offset_minutes: 0,
    }
}

pub fn new_client() -> Actor {
    Actor::new(Uuid::new_v4(), ActorRole::Client)
}
