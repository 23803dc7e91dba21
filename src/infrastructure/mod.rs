//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Modules: Source-unit discovery and import
//! - Remote: The platform's command registry API
//! - Adapters: Platform integrations (console)

pub mod adapters;
pub mod config;
pub mod modules;
pub mod remote;
