//! Reload service - re-imports command units at runtime
//!
//! File search and parsing run on the blocking pool; the registry is only
//! touched once every replacement descriptor is ready, and then in a single
//! swap, so a concurrent dispatch never sees a command missing.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::errors::{LoadError, ReloadError};
use crate::application::registry::ModuleRegistry;
use crate::domain::entities::{CommandDescriptor, StructuredCommandDescriptor};
use crate::infrastructure::config::ModulesConfig;
use crate::infrastructure::modules::discovery::{discover, find_by_stem};
use crate::infrastructure::modules::UnitImporter;

/// What a reload changed
#[derive(Debug, Default)]
pub struct ReloadReport {
    pub commands: Vec<String>,
    pub structured: Vec<String>,
    pub skipped: Vec<LoadError>,
}

impl ReloadReport {
    pub fn total(&self) -> usize {
        self.commands.len() + self.structured.len()
    }
}

type Imported = (
    Vec<Result<CommandDescriptor, LoadError>>,
    Vec<Result<StructuredCommandDescriptor, LoadError>>,
);

pub struct ReloadService {
    modules: ModulesConfig,
    importer: UnitImporter,
    registry: Arc<ModuleRegistry>,
}

impl ReloadService {
    pub fn new(
        modules: ModulesConfig,
        importer: UnitImporter,
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        Self {
            modules,
            importer,
            registry,
        }
    }

    async fn import_blocking<F>(&self, select: F) -> Result<Imported, ReloadError>
    where
        F: FnOnce(&ModulesConfig) -> (Vec<PathBuf>, Vec<PathBuf>) + Send + 'static,
    {
        let modules = self.modules.clone();
        let importer = self.importer.clone();
        tokio::task::spawn_blocking(move || {
            let (command_paths, structured_paths) = select(&modules);
            let commands = command_paths
                .iter()
                .map(|p| importer.import_command(p))
                .collect();
            let structured = structured_paths
                .iter()
                .map(|p| importer.import_structured(p))
                .collect();
            (commands, structured)
        })
        .await
        .map_err(|e| ReloadError::Task(e.to_string()))
    }

    /// Re-import the unit(s) whose file stem matches `name` and swap them in.
    ///
    /// `name` may also be an alias of a live command; the matching file is
    /// still looked up by the canonical name.
    pub async fn reload_one(&self, name: &str) -> Result<ReloadReport, ReloadError> {
        let canonical = self
            .registry
            .lookup(name)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| name.to_lowercase());

        let wanted = canonical.clone();
        let (commands, structured) = self
            .import_blocking(move |modules| {
                (
                    find_by_stem(&[modules.commands.as_path()], &wanted, modules),
                    find_by_stem(&[modules.slash.as_path()], &wanted, modules),
                )
            })
            .await?;

        if commands.is_empty() && structured.is_empty() {
            return Err(ReloadError::NotFound(name.to_string()));
        }

        // All or nothing: one bad file leaves the registry untouched
        let commands = commands.into_iter().collect::<Result<Vec<_>, _>>()?;
        let structured = structured.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut report = ReloadReport::default();
        for descriptor in commands {
            let new_name = descriptor.name.clone();
            self.registry.replace(&canonical, descriptor);
            report.commands.push(new_name);
        }
        for descriptor in structured {
            let new_name = descriptor.name.clone();
            self.registry.replace_structured(&canonical, descriptor);
            report.structured.push(new_name);
        }

        tracing::info!(
            "Reloaded '{}' ({} command, {} structured)",
            canonical,
            report.commands.len(),
            report.structured.len()
        );
        Ok(report)
    }

    /// Re-import every command and structured command and swap the indexes wholesale.
    ///
    /// Units that fail to import are skipped with a warning and are absent
    /// from the rebuilt registry.
    pub async fn reload_all(&self) -> Result<ReloadReport, ReloadError> {
        let (commands, structured) = self
            .import_blocking(|modules| {
                (
                    discover(&modules.commands, modules),
                    discover(&modules.slash, modules),
                )
            })
            .await?;

        let mut report = ReloadReport::default();
        let mut fresh_commands = Vec::new();
        for result in commands {
            match result {
                Ok(d) => {
                    report.commands.push(d.name.clone());
                    fresh_commands.push(d);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", e.path().display(), e);
                    report.skipped.push(e);
                }
            }
        }
        let mut fresh_structured = Vec::new();
        for result in structured {
            match result {
                Ok(d) => {
                    report.structured.push(d.name.clone());
                    fresh_structured.push(d);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", e.path().display(), e);
                    report.skipped.push(e);
                }
            }
        }

        self.registry.rebuild(fresh_commands);
        self.registry.rebuild_structured(fresh_structured);

        tracing::info!(
            "Reloaded all modules: {} commands, {} structured, {} skipped",
            report.commands.len(),
            report.structured.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
