pub mod availability;
pub mod booking;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod status;

pub use availability::{compute_slots, AvailabilityService};
pub use booking::{BookingCoordinator, BookingLocks};
pub use engine::SchedulingEngine;
pub use events::{BookingEvent, BroadcastEventSink, EventError, EventSink, NoopEventSink};
pub use ledger::BookingLedger;
pub use lifecycle::AppointmentLifecycleService;
pub use status::StatusService;
