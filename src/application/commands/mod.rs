// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between callers and services
// - Commands accept DTOs or domain inputs, return DTOs
// - Commands handle error conversion
// - Commands NEVER contain business logic

pub mod account_commands;
pub mod catalog_commands;
pub mod release_commands;

pub use account_commands::*;
pub use catalog_commands::*;
pub use release_commands::*;
