//! Module loader - Discovers source units and populates the registry at startup

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::discovery::discover;
use super::import::UnitImporter;
use crate::application::errors::LoadError;
use crate::application::runtime::RuntimeContext;
use crate::infrastructure::config::ModulesConfig;

/// What a full load did
#[derive(Debug, Default)]
pub struct LoadReport {
    pub commands: usize,
    pub structured: usize,
    pub events: usize,
    pub addons: usize,
    /// Units that were skipped, one entry per unit
    pub warnings: Vec<LoadError>,
    /// Addon initializers still running in the background
    pub addon_tasks: Vec<JoinHandle<()>>,
}

impl LoadReport {
    fn skip(&mut self, err: LoadError) {
        tracing::warn!("Skipping {}: {}", err.path().display(), err);
        self.warnings.push(err);
    }
}

/// Startup loader.
///
/// Fail-open: a unit that can't be imported is skipped with a warning and the
/// rest of the load continues.
pub struct ModuleLoader {
    modules: ModulesConfig,
    importer: UnitImporter,
}

impl ModuleLoader {
    pub fn new(modules: ModulesConfig, importer: UnitImporter) -> Self {
        Self { modules, importer }
    }

    /// Load commands, structured commands, events and addons from every configured root
    pub fn load_all(&self, runtime: &Arc<RuntimeContext>) -> LoadReport {
        let mut report = LoadReport::default();
        self.load_commands(runtime, &mut report);
        self.load_structured(runtime, &mut report);
        self.load_events(runtime, &mut report);
        self.load_addons(runtime, &mut report);

        tracing::info!(
            "Loaded {} commands, {} structured commands, {} events, {} addons ({} skipped)",
            report.commands,
            report.structured,
            report.events,
            report.addons,
            report.warnings.len()
        );
        report
    }

    fn load_commands(&self, runtime: &RuntimeContext, report: &mut LoadReport) {
        for path in discover(&self.modules.commands, &self.modules) {
            match self.importer.import_command(&path) {
                Ok(descriptor) => {
                    tracing::debug!(
                        "Registered command '{}' [{}]",
                        descriptor.name,
                        descriptor.category
                    );
                    runtime.registry.register(descriptor);
                    report.commands += 1;
                }
                Err(e) => report.skip(e),
            }
        }
    }

    fn load_structured(&self, runtime: &RuntimeContext, report: &mut LoadReport) {
        for path in discover(&self.modules.slash, &self.modules) {
            match self.importer.import_structured(&path) {
                Ok(descriptor) => {
                    tracing::debug!("Registered structured command '{}'", descriptor.name);
                    runtime.registry.register_structured(descriptor);
                    report.structured += 1;
                }
                Err(e) => report.skip(e),
            }
        }
    }

    fn load_events(&self, runtime: &RuntimeContext, report: &mut LoadReport) {
        for path in discover(&self.modules.events, &self.modules) {
            match self.importer.import_event(&path) {
                Ok(binding) => {
                    let binding = runtime.registry.register_event(binding);
                    runtime
                        .events
                        .subscribe(binding.event.clone(), binding.handler.clone(), binding.once);
                    tracing::debug!(
                        "Bound event '{}' ({})",
                        binding.event,
                        if binding.once { "once" } else { "on" }
                    );
                    report.events += 1;
                }
                Err(e) => report.skip(e),
            }
        }
    }

    fn load_addons(&self, runtime: &Arc<RuntimeContext>, report: &mut LoadReport) {
        for path in discover(&self.modules.addons, &self.modules) {
            let addon = match self.importer.import_addon(&path) {
                Ok(addon) => runtime.registry.register_addon(addon),
                Err(e) => {
                    report.skip(e);
                    continue;
                }
            };

            tracing::info!(
                "Starting addon {} v{} by {} (permissions: {})",
                addon.name,
                addon.version,
                addon.author.as_deref().unwrap_or("unknown"),
                addon.permissions
            );

            let runtime = Arc::clone(runtime);
            let task = tokio::spawn(async move {
                match addon
                    .initializer
                    .initialize(runtime, addon.config.clone())
                    .await
                {
                    Ok(()) => tracing::info!("Addon {} initialized", addon.name),
                    Err(e) => tracing::warn!("Addon {} failed to initialize: {}", addon.name, e),
                }
            });
            report.addon_tasks.push(task);
            report.addons += 1;
        }
    }
}
