//! Engine - one bot instance: load, deploy, dispatch

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::errors::{BotError, ConfigError, ReloadError};
use crate::application::handlers::HandlerTable;
use crate::application::messaging::{
    DispatchOutcome, DispatchPipeline, FaultReport, TriggerParser,
};
use crate::application::registry::ModuleRegistry;
use crate::application::runtime::RuntimeContext;
use crate::application::services::{DeployReport, ReloadReport, RemoteRegistrySync};
use crate::domain::entities::Trigger;
use crate::domain::traits::{PermissionProbe, RemoteRegistry};
use crate::infrastructure::config::Config;
use crate::infrastructure::modules::{LoadReport, ModuleLoader, UnitImporter};

/// Owns every component of one bot. Nothing is process-global, so several
/// engines (e.g. in tests) can live side by side.
pub struct Engine {
    runtime: Arc<RuntimeContext>,
    loader: ModuleLoader,
    pipeline: DispatchPipeline,
    parser: TriggerParser,
    sync: Option<RemoteRegistrySync>,
}

impl Engine {
    pub fn new(config: Config, handlers: HandlerTable, probe: Arc<dyn PermissionProbe>) -> Self {
        let config = Arc::new(config);
        let handlers = Arc::new(handlers);
        let runtime = RuntimeContext::assemble(config.clone(), handlers.clone());

        let mut parser = TriggerParser::new(config.bot.prefix.clone());
        if let Some(bot_id) = &config.bot.bot_id {
            parser = parser.with_bot_id(bot_id.clone());
        }

        Self {
            loader: ModuleLoader::new(config.modules.clone(), UnitImporter::new(handlers)),
            pipeline: DispatchPipeline::new(runtime.clone(), probe),
            parser,
            sync: None,
            runtime,
        }
    }

    /// Enable structured-command deploys
    pub fn with_remote(mut self, remote: Arc<dyn RemoteRegistry>) -> Self {
        self.sync = Some(RemoteRegistrySync::new(remote, self.runtime.registry.clone()));
        self
    }

    /// Forward handler faults to an operator channel
    pub fn with_fault_channel(mut self, sender: mpsc::UnboundedSender<FaultReport>) -> Self {
        self.pipeline = self.pipeline.with_fault_channel(sender);
        self
    }

    pub fn runtime(&self) -> &Arc<RuntimeContext> {
        &self.runtime
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.runtime.registry
    }

    pub fn parser(&self) -> &TriggerParser {
        &self.parser
    }

    pub fn pipeline(&self) -> &DispatchPipeline {
        &self.pipeline
    }

    /// Populate the registry from every configured source root
    pub fn load(&self) -> LoadReport {
        self.loader.load_all(&self.runtime)
    }

    /// Load, then publish structured commands when a remote registry is set.
    ///
    /// A failed deploy is logged and dispatch still starts; the previous
    /// remote registrations stay live.
    pub async fn start(&self) -> LoadReport {
        let report = self.load();
        if self.sync.is_some() {
            if let Err(e) = self.deploy().await {
                tracing::warn!("Starting without a fresh structured-command deploy: {}", e);
            }
        }
        self.runtime.events.emit("ready", serde_json::Value::Null).await;
        report
    }

    pub async fn deploy(&self) -> Result<DeployReport, BotError> {
        let sync = self
            .sync
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("remote".to_string()))?;
        sync.deploy_current().await.map_err(BotError::from)
    }

    pub async fn handle(&self, trigger: Trigger) -> DispatchOutcome {
        self.pipeline.handle(trigger).await
    }

    /// Parse and dispatch a raw text message; `None` when it isn't a command
    pub async fn handle_text(
        &self,
        raw: &str,
        author_id: &str,
        channel_id: &str,
        context_id: Option<String>,
    ) -> Option<DispatchOutcome> {
        let trigger = self.parser.parse_text(raw, author_id, channel_id, context_id)?;
        Some(self.pipeline.handle(trigger).await)
    }

    pub async fn handle_structured(
        &self,
        name: &str,
        options: BTreeMap<String, serde_json::Value>,
        author_id: &str,
        channel_id: &str,
        context_id: Option<String>,
    ) -> DispatchOutcome {
        let trigger = self
            .parser
            .parse_structured(name, options, author_id, channel_id, context_id);
        self.pipeline.handle(trigger).await
    }

    pub async fn emit(&self, event: &str, payload: serde_json::Value) -> usize {
        self.runtime.events.emit(event, payload).await
    }

    pub async fn reload_one(&self, name: &str) -> Result<ReloadReport, ReloadError> {
        self.runtime.reloader.reload_one(name).await
    }

    pub async fn reload_all(&self) -> Result<ReloadReport, ReloadError> {
        self.runtime.reloader.reload_all().await
    }
}
