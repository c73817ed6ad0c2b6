// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod catalog_service;
pub mod lifecycle;
pub mod play_count_service;
pub mod scheduler;

// Re-export all services and their types
pub use catalog_service::{artist_stats, merge_catalog, CatalogService, UNRANKED};

pub use lifecycle::{DecisionOutcome, DeleteOutcome, LifecycleService, ResolveOutcome, Session};

pub use play_count_service::{ambient_increment_cap, ListenSession, PlayCountService};

pub use scheduler::Scheduler;
