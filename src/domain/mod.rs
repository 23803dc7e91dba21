//! Domain layer - descriptors, triggers and the seams to the platform
//!
//! This layer contains:
//! - Entities: command/event/addon descriptors, permissions, triggers
//! - Traits: handler contracts, the permission probe, the remote registry, the bot connector

pub mod entities;
pub mod traits;
