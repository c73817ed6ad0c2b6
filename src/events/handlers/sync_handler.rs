// src/events/handlers/sync_handler.rs
//
// Bridges local DataChanged events to the cross-session sync hub.
//
// CRITICAL RULES:
// - Only consumes DataChanged
// - Never reloads anything itself; receivers decide what to refresh

use crate::events::sync::SyncHandle;
use crate::events::types::DataChanged;
use crate::events::EventBus;

pub fn register_sync_handlers(bus: &EventBus, sync: SyncHandle) {
    bus.subscribe::<DataChanged, _>(move |event| {
        let reached = sync.publish(event.topic);
        log::debug!("[SYNC] {:?} published to {} receivers", event.topic, reached);
    });

    log::debug!("[SYNC] Handlers registered");
}
