//! Live runtime handed to handlers and addon initializers

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::cooldown::CooldownTracker;
use crate::application::handlers::HandlerTable;
use crate::application::messaging::EventBus;
use crate::application::registry::ModuleRegistry;
use crate::application::services::ReloadService;
use crate::infrastructure::config::Config;
use crate::infrastructure::modules::UnitImporter;

/// Shared engine state. One instance per engine; nothing here is global.
pub struct RuntimeContext {
    pub config: Arc<Config>,
    pub registry: Arc<ModuleRegistry>,
    pub events: Arc<EventBus>,
    pub cooldowns: Arc<CooldownTracker>,
    pub reloader: Arc<ReloadService>,
    pub started_at: DateTime<Utc>,
}

impl RuntimeContext {
    /// Fresh registry, bus and cooldown tracker wired around `handlers`
    pub fn assemble(config: Arc<Config>, handlers: Arc<HandlerTable>) -> Arc<Self> {
        let registry = Arc::new(ModuleRegistry::new());
        let reloader = Arc::new(ReloadService::new(
            config.modules.clone(),
            UnitImporter::new(handlers),
            registry.clone(),
        ));
        Arc::new(Self {
            config,
            registry,
            events: Arc::new(EventBus::new()),
            cooldowns: Arc::new(CooldownTracker::new()),
            reloader,
            started_at: Utc::now(),
        })
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
