//! Application services - Lifecycle orchestration

pub mod reload_service;
pub mod sync_service;

pub use reload_service::{ReloadReport, ReloadService};
pub use sync_service::{DeployReport, RemoteRegistrySync};
