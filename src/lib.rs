//! botcore - command & module lifecycle engine for chat bots
//!
//! Commands, structured commands, event listeners and addons are declared in
//! YAML/JSON source units that name a native handler. Units are discovered at
//! startup, can be reloaded at runtime without dropping in-flight dispatches,
//! and structured commands are published to the platform's command registry.

pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

pub use application::engine::Engine;
pub use application::handlers::HandlerTable;
pub use infrastructure::config::Config;
