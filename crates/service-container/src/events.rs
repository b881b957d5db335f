//! Lifecycle events

use crate::name::ServiceName;
use crate::state::State;
use async_channel::{Receiver, Sender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// What happened to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Controller installed into its registrations
    Installed,
    /// Published state changed
    StateChanged {
        /// Previous state
        from: State,
        /// New state
        to: State,
    },
    /// User start logic failed
    StartFailed {
        /// Failure description
        reason: String,
    },
    /// User stop logic failed; the service still went down
    StopFailed {
        /// Failure description
        reason: String,
    },
    /// A dependency of the service is being replaced
    ReplacementStarted {
        /// Dependency being replaced
        dependency: ServiceName,
    },
    /// A replaced dependency has been installed again
    ReplacementConcluded {
        /// Dependency that was replaced
        dependency: ServiceName,
    },
    /// Controller removed from the container
    Removed,
}

/// Lifecycle event delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Service the event is about
    pub service: ServiceName,
    /// Event details
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Fan-out of lifecycle events to subscriber channels
#[derive(Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<Sender<LifecycleEvent>>>,
}

impl EventBus {
    pub fn subscribe(&self) -> Receiver<LifecycleEvent> {
        let (sender, receiver) = async_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    pub fn emit(&self, service: &ServiceName, kind: EventKind) {
        let event = LifecycleEvent {
            timestamp: Utc::now(),
            service: service.clone(),
            kind,
        };
        trace!("Lifecycle event for {}: {:?}", service, event.kind);

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.try_send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_subscribers_are_pruned() {
        let bus = EventBus::default();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        let name = ServiceName::parse("db");
        bus.emit(&name, EventKind::Installed);

        assert_eq!(bus.subscribers.lock().unwrap().len(), 1);
        let event = kept.try_recv().unwrap();
        assert_eq!(event.service, name);
        assert_eq!(event.kind, EventKind::Installed);
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = LifecycleEvent {
            timestamp: Utc::now(),
            service: ServiceName::parse("db"),
            kind: EventKind::StateChanged {
                from: State::Down,
                to: State::Up,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "state_changed");
        assert_eq!(json["to"], "Up");
        assert_eq!(json["service"], "db");
    }
}
