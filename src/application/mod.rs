//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Registry: the live command, alias and category indexes
//! - Messaging: trigger parsing, gates, dispatch and events
//! - Services: reload and remote sync orchestration
//! - Engine: wires the pieces together for one bot instance

pub mod cooldown;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod messaging;
pub mod registry;
pub mod runtime;
pub mod services;
