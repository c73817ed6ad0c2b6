// src/events/handlers/mod.rs
//
// Cross-cutting event handlers.
//
// Service-owned reactions are registered by each service's
// `register_event_handlers`; only bridges with no owning service live here.

pub mod sync_handler;

pub use sync_handler::register_sync_handlers;
