use std::sync::Mutex;

use serde::Serialize;

/// What a service reports after it finished an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// A paged search ran. `conditions` is `None` when the client sent no list.
    Searched {
        entity: &'static str,
        total: u64,
        conditions: Option<usize>,
    },
    /// A lifecycle transition (create, update, delete, restore, sell, block...)
    /// was persisted.
    Transitioned {
        entity: &'static str,
        id: String,
        action: &'static str,
        actor: String,
    },
    /// A new price history record was appended.
    PriceRecorded {
        product_id: String,
        price: String,
        actor: String,
    },
}

/// Receives service diagnostics. Implementations must not fail the caller.
pub trait Observer: Send + Sync {
    fn record(&self, event: ServiceEvent);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn record(&self, event: ServiceEvent) {
        match event {
            ServiceEvent::Searched {
                entity,
                total,
                conditions,
            } => match conditions {
                Some(n) => ::tracing::info!(entity, total, conditions = n, "search completed"),
                None => ::tracing::info!(entity, total, conditions = "none", "search completed"),
            },
            ServiceEvent::Transitioned {
                entity,
                id,
                action,
                actor,
            } => ::tracing::info!(entity, %id, action, %actor, "entity transitioned"),
            ServiceEvent::PriceRecorded {
                product_id,
                price,
                actor,
            } => ::tracing::info!(%product_id, %price, %actor, "price recorded"),
        }
    }
}

/// Keeps every event in memory; used by tests to assert on diagnostics.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ServiceEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ServiceEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Observer for RecordingObserver {
    fn record(&self, event: ServiceEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_events_in_order() {
        let obs = RecordingObserver::new();
        obs.record(ServiceEvent::Searched {
            entity: "product",
            total: 3,
            conditions: None,
        });
        obs.record(ServiceEvent::PriceRecorded {
            product_id: "p".to_string(),
            price: "10".to_string(),
            actor: "alice".to_string(),
        });
        let events = obs.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServiceEvent::Searched { total: 3, .. }));

        obs.clear();
        assert!(obs.events().is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(ServiceEvent::Searched {
            entity: "product",
            total: 1,
            conditions: Some(2),
        })
        .unwrap();
        assert_eq!(json["event"], "searched");
        assert_eq!(json["conditions"], 2);
    }

    #[test]
    fn tracing_observer_does_not_panic_without_subscriber() {
        TracingObserver.record(ServiceEvent::Transitioned {
            entity: "product",
            id: "1".to_string(),
            action: "sell",
            actor: "alice".to_string(),
        });
    }
}
