// src/events/bus/event_bus.rs
//
// In-process event bus.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - handlers run on the emitting thread, in subscription order
// 2. Observable - every emission is logged and kept in a bounded log
// 3. Type-safe - handlers are keyed by the concrete event type
// 4. Re-entrant - handlers may emit or subscribe while being dispatched

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use crate::events::types::DomainEvent;

/// Type-erased handler; downcasts to the concrete event inside
type EventHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Emissions kept for inspection
const EVENT_LOG_CAPACITY: usize = 1024;

/// Decouples the lifecycle engine from its observers (catalog cache,
/// play history, sync fan-out).
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<TypeId, Vec<EventHandler>>>>,
    event_log: Arc<RwLock<VecDeque<EventLogEntry>>>,
}

#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            event_log: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Subscribe to one event type. Handlers run in subscription order.
    ///
    /// ```ignore
    /// bus.subscribe::<ReleaseRemoved, _>(|event| {
    ///     log::info!("removed {}", event.release_id);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: EventHandler = Arc::new(move |event_any: &dyn Any| {
            if let Some(event) = event_any.downcast_ref::<E>() {
                handler(event);
            } else {
                log::error!(
                    "Failed to downcast event in handler for {}",
                    std::any::type_name::<E>()
                );
            }
        });

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Dispatch an event to every subscriber of its type.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run.
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        // Snapshot so handlers can subscribe or emit without deadlocking
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        let entry = EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id().to_string(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count: handlers.len(),
        };
        log::debug!(
            "[EVENT] {} (id: {}) | {} handlers",
            entry.event_type,
            entry.event_id,
            entry.handler_count
        );
        {
            let mut log = self
                .event_log
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if log.len() == EVENT_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(entry);
        }

        for (idx, handler) in handlers.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any);
            }));
            if let Err(e) = result {
                log::error!(
                    "Handler {} for {} panicked: {:?}",
                    idx,
                    event.event_type(),
                    e
                );
            }
        }
    }

    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        self.event_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear_event_log(&self) {
        self.event_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn subscriber_count<E>(&self) -> usize
    where
        E: 'static,
    {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share handlers and log
impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            event_log: Arc::clone(&self.event_log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_subscribe_and_emit() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        bus.subscribe::<ReleaseSubmitted, _>(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ReleaseSubmitted::new("rel_1".to_string(), "art_1".to_string()));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multiple_handlers_execute_in_order() {
        let bus = EventBus::new();
        let sequence = Arc::new(Mutex::new(Vec::new()));

        for n in 1..=3 {
            let seq = Arc::clone(&sequence);
            bus.subscribe::<CatalogInvalidated, _>(move |_| {
                seq.lock().unwrap().push(n);
            });
        }

        bus.emit(CatalogInvalidated::new("test"));

        assert_eq!(*sequence.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_event_log_records_emissions() {
        let bus = EventBus::new();

        bus.emit(ReleaseSubmitted::new("rel_1".to_string(), "art_1".to_string()));
        bus.emit(CatalogInvalidated::new("test"));

        let log = bus.get_event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event_type, "ReleaseSubmitted");
        assert_eq!(log[1].event_type, "CatalogInvalidated");

        bus.clear_event_log();
        assert!(bus.get_event_log().is_empty());
    }

    #[test]
    fn test_event_log_is_bounded() {
        let bus = EventBus::new();
        for _ in 0..EVENT_LOG_CAPACITY + 10 {
            bus.emit(CatalogInvalidated::new("test"));
        }
        assert_eq!(bus.get_event_log().len(), EVENT_LOG_CAPACITY);
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();

        assert_eq!(bus.subscriber_count::<ReleaseSubmitted>(), 0);
        bus.subscribe::<ReleaseSubmitted, _>(|_| {});
        bus.subscribe::<ReleaseSubmitted, _>(|_| {});
        assert_eq!(bus.subscriber_count::<ReleaseSubmitted>(), 2);
        assert_eq!(bus.subscriber_count::<CatalogInvalidated>(), 0);
    }

    #[test]
    fn test_handler_panic_doesnt_break_bus() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe::<CatalogInvalidated, _>(|_| {
            panic!("Intentional panic");
        });
        let counter_clone = Arc::clone(&counter);
        bus.subscribe::<CatalogInvalidated, _>(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(CatalogInvalidated::new("test"));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_emit_follow_up_event() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let inner = bus.clone();
        bus.subscribe::<ReleaseSubmitted, _>(move |_| {
            inner.emit(CatalogInvalidated::new("follow-up"));
        });
        let counter_clone = Arc::clone(&counter);
        bus.subscribe::<CatalogInvalidated, _>(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ReleaseSubmitted::new("rel_1".to_string(), "art_1".to_string()));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
