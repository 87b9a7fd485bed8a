// libs/appointment-cell/src/services/events.rs
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use shared_models::auth::Actor;

use crate::models::{Appointment, AppointmentStatus};

pub type BookingEventSender = broadcast::Sender<BookingEvent>;
pub type BookingEventReceiver = broadcast::Receiver<BookingEvent>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    Created {
        appointment: Appointment,
    },
    StatusChanged {
        appointment: Appointment,
        old_status: AppointmentStatus,
        new_status: AppointmentStatus,
        actor: Actor,
    },
}

impl BookingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::Created { .. } => "booking_created",
            BookingEvent::StatusChanged { .. } => "status_changed",
        }
    }

    pub fn appointment(&self) -> &Appointment {
        match self {
            BookingEvent::Created { appointment } => appointment,
            BookingEvent::StatusChanged { appointment, .. } => appointment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("No subscribers for {0}")]
    NoSubscribers(&'static str),

    #[error("Event delivery failed: {0}")]
    Delivery(String),
}

/// Receives booking notifications after the change they describe is
/// committed.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &BookingEvent) -> Result<(), EventError>;
}

/// Fans events out to every subscriber over a broadcast channel.
pub struct BroadcastEventSink {
    sender: BookingEventSender,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> BookingEventReceiver {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: &BookingEvent) -> Result<(), EventError> {
        self.sender
            .send(event.clone())
            .map(|receivers| debug!("{} delivered to {} subscribers", event.name(), receivers))
            .map_err(|_| EventError::NoSubscribers(event.name()))
    }
}

/// Sink that drops everything. Used when nothing listens.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: &BookingEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Publishes and swallows failures. A committed booking stays committed
/// whatever happens to its notification.
pub fn emit(sink: &dyn EventSink, event: BookingEvent) {
    if let Err(e) = sink.publish(&event) {
        warn!(
            "Failed to publish {} for appointment {}: {}",
            event.name(),
            event.appointment().id,
            e
        );
    }
}
