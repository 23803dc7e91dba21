//! Module registry - authoritative in-memory indexes
//!
//! Text commands, their aliases and the category index share one lock so a
//! replacement (name, aliases and category together) is a single swap. Readers
//! clone the `Arc` they resolve and never observe a half-applied reload.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{
    AddonDescriptor, CommandDescriptor, EventBinding, StructuredCommandDescriptor,
};

/// An alias that already pointed somewhere else when a command was registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub alias: String,
    /// Command (or alias target) that owned the key before
    pub previous: String,
    /// Command that registered the alias now
    pub command: String,
    /// The alias equals a live command name and will never resolve
    pub shadowed_by_name: bool,
}

#[derive(Default, Clone)]
struct CommandIndex {
    commands: HashMap<String, Arc<CommandDescriptor>>,
    aliases: HashMap<String, String>,
    categories: BTreeMap<String, Vec<String>>,
}

impl CommandIndex {
    fn resolve(&self, input: &str) -> Option<&Arc<CommandDescriptor>> {
        self.commands.get(input).or_else(|| {
            self.aliases
                .get(input)
                .and_then(|name| self.commands.get(name))
        })
    }

    fn remove(&mut self, name: &str) -> Option<Arc<CommandDescriptor>> {
        let removed = self.commands.remove(name)?;
        self.aliases.retain(|_, target| target != name);
        if let Some(names) = self.categories.get_mut(&removed.category) {
            names.retain(|n| n != name);
            if names.is_empty() {
                self.categories.remove(&removed.category);
            }
        }
        Some(removed)
    }

    fn insert(&mut self, descriptor: Arc<CommandDescriptor>) -> Vec<AliasConflict> {
        let name = descriptor.name.clone();
        self.remove(&name);

        let mut conflicts = Vec::new();
        for alias in &descriptor.aliases {
            if *alias == name {
                continue;
            }
            if self.commands.contains_key(alias) {
                conflicts.push(AliasConflict {
                    alias: alias.clone(),
                    previous: alias.clone(),
                    command: name.clone(),
                    shadowed_by_name: true,
                });
            } else if let Some(previous) = self.aliases.get(alias) {
                if *previous != name {
                    conflicts.push(AliasConflict {
                        alias: alias.clone(),
                        previous: previous.clone(),
                        command: name.clone(),
                        shadowed_by_name: false,
                    });
                }
            }
            self.aliases.insert(alias.clone(), name.clone());
        }

        // A new command name hides any alias with the same key
        if let Some(previous) = self.aliases.remove(&name) {
            conflicts.push(AliasConflict {
                alias: name.clone(),
                previous,
                command: name.clone(),
                shadowed_by_name: true,
            });
        }

        let names = self.categories.entry(descriptor.category.clone()).or_default();
        names.push(name.clone());
        self.commands.insert(name, descriptor);
        conflicts
    }
}

fn log_conflicts(conflicts: &[AliasConflict]) {
    for conflict in conflicts {
        if conflict.shadowed_by_name {
            tracing::warn!(
                "Alias '{}' of '{}' collides with a command name; the command name wins",
                conflict.alias,
                conflict.command
            );
        } else {
            tracing::warn!(
                "Alias '{}' moved from '{}' to '{}'",
                conflict.alias,
                conflict.previous,
                conflict.command
            );
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of commands, structured commands, events and addons
#[derive(Default)]
pub struct ModuleRegistry {
    commands: RwLock<CommandIndex>,
    structured: RwLock<HashMap<String, Arc<StructuredCommandDescriptor>>>,
    events: RwLock<Vec<Arc<EventBinding>>>,
    addons: RwLock<HashMap<String, Arc<AddonDescriptor>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. A colliding name is replaced (last write wins).
    pub fn register(&self, descriptor: CommandDescriptor) -> Vec<AliasConflict> {
        let conflicts = write(&self.commands).insert(Arc::new(descriptor));
        log_conflicts(&conflicts);
        conflicts
    }

    /// Remove a command together with every alias pointing at it
    pub fn unregister(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        write(&self.commands).remove(&name.to_lowercase())
    }

    /// Swap `old_name` for `descriptor` in one step.
    ///
    /// The new descriptor may carry a different name; aliases of the old one
    /// are dropped either way.
    pub fn replace(&self, old_name: &str, descriptor: CommandDescriptor) -> Vec<AliasConflict> {
        let descriptor = Arc::new(descriptor);
        let conflicts = {
            let mut index = write(&self.commands);
            index.remove(&old_name.to_lowercase());
            index.insert(descriptor)
        };
        log_conflicts(&conflicts);
        conflicts
    }

    /// Replace the whole command index.
    ///
    /// The new index is built before the lock is taken.
    pub fn rebuild(&self, descriptors: Vec<CommandDescriptor>) -> Vec<AliasConflict> {
        let mut fresh = CommandIndex::default();
        let mut conflicts = Vec::new();
        for descriptor in descriptors {
            conflicts.extend(fresh.insert(Arc::new(descriptor)));
        }
        log_conflicts(&conflicts);
        *write(&self.commands) = fresh;
        conflicts
    }

    /// Find a command by name or alias, case-insensitively
    pub fn lookup(&self, name_or_alias: &str) -> Option<Arc<CommandDescriptor>> {
        read(&self.commands)
            .resolve(&name_or_alias.to_lowercase())
            .cloned()
    }

    /// Commands of a category in registration order
    pub fn list_by_category(&self, category: &str) -> Vec<Arc<CommandDescriptor>> {
        let index = read(&self.commands);
        index
            .categories
            .get(category)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| index.commands.get(n).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<String> {
        read(&self.commands).categories.keys().cloned().collect()
    }

    /// All commands sorted by name
    pub fn commands(&self) -> Vec<Arc<CommandDescriptor>> {
        let mut all: Vec<_> = read(&self.commands).commands.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        read(&self.commands).commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn register_structured(&self, descriptor: StructuredCommandDescriptor) {
        let name = descriptor.name.clone();
        write(&self.structured).insert(name, Arc::new(descriptor));
    }

    pub fn unregister_structured(&self, name: &str) -> Option<Arc<StructuredCommandDescriptor>> {
        write(&self.structured).remove(&name.to_lowercase())
    }

    pub fn replace_structured(&self, old_name: &str, descriptor: StructuredCommandDescriptor) {
        let mut structured = write(&self.structured);
        structured.remove(&old_name.to_lowercase());
        structured.insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    pub fn rebuild_structured(&self, descriptors: Vec<StructuredCommandDescriptor>) {
        let fresh: HashMap<_, _> = descriptors
            .into_iter()
            .map(|d| (d.name.clone(), Arc::new(d)))
            .collect();
        *write(&self.structured) = fresh;
    }

    pub fn lookup_structured(&self, name: &str) -> Option<Arc<StructuredCommandDescriptor>> {
        read(&self.structured).get(&name.to_lowercase()).cloned()
    }

    /// Current structured commands sorted by name, as pushed to the remote registry
    pub fn structured_snapshot(&self) -> Vec<Arc<StructuredCommandDescriptor>> {
        let mut all: Vec<_> = read(&self.structured).values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn register_event(&self, binding: EventBinding) -> Arc<EventBinding> {
        let binding = Arc::new(binding);
        write(&self.events).push(binding.clone());
        binding
    }

    pub fn events(&self) -> Vec<Arc<EventBinding>> {
        read(&self.events).clone()
    }

    pub fn register_addon(&self, descriptor: AddonDescriptor) -> Arc<AddonDescriptor> {
        let descriptor = Arc::new(descriptor);
        if let Some(previous) =
            write(&self.addons).insert(descriptor.name.clone(), descriptor.clone())
        {
            tracing::warn!(
                "Addon '{}' v{} replaced by v{}",
                previous.name,
                previous.version,
                descriptor.version
            );
        }
        descriptor
    }

    pub fn addon(&self, name: &str) -> Option<Arc<AddonDescriptor>> {
        read(&self.addons).get(name).cloned()
    }

    pub fn addons(&self) -> Vec<Arc<AddonDescriptor>> {
        read(&self.addons).values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerError;
    use crate::domain::traits::{CommandHandler, Invocation, Reply};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn execute(&self, _invocation: Invocation) -> Result<Reply, HandlerError> {
            Ok(Reply::new("noop"))
        }
    }

    fn command(name: &str, aliases: &[&str], category: &str) -> CommandDescriptor {
        CommandDescriptor::new(name, Arc::new(Noop))
            .with_aliases(aliases.iter().map(|a| a.to_string()).collect())
            .with_category(category)
    }

    #[test]
    fn test_alias_resolves_to_same_instance() {
        let registry = ModuleRegistry::new();
        registry.register(command("balance", &["bal", "money"], "economy"));

        let by_name = registry.lookup("balance").unwrap();
        let by_alias = registry.lookup("bal").unwrap();
        let by_other = registry.lookup("MONEY").unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_alias));
        assert!(Arc::ptr_eq(&by_name, &by_other));
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let registry = ModuleRegistry::new();
        assert!(registry.lookup("nothing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_same_name_replaces_and_drops_old_aliases() {
        let registry = ModuleRegistry::new();
        registry.register(command("ban", &["b", "hammer"], "moderation"));
        registry.register(command("ban", &["b"], "moderation"));

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("b").is_some());
        assert!(registry.lookup("hammer").is_none());
    }

    #[test]
    fn test_unregister_removes_aliases_and_category() {
        let registry = ModuleRegistry::new();
        registry.register(command("kick", &["k"], "moderation"));

        assert!(registry.unregister("kick").is_some());
        assert!(registry.lookup("k").is_none());
        assert!(registry.categories().is_empty());
    }

    #[test]
    fn test_alias_collision_is_reported_and_last_wins() {
        let registry = ModuleRegistry::new();
        registry.register(command("play", &["p"], "music"));
        let conflicts = registry.register(command("profile", &["p"], "social"));

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].previous, "play");
        assert!(!conflicts[0].shadowed_by_name);
        assert_eq!(registry.lookup("p").unwrap().name, "profile");
    }

    #[test]
    fn test_alias_equal_to_command_name_never_shadows_it() {
        let registry = ModuleRegistry::new();
        registry.register(command("help", &[], "general"));
        let conflicts = registry.register(command("helper", &["help"], "general"));

        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].shadowed_by_name);
        assert_eq!(registry.lookup("help").unwrap().name, "help");
    }

    #[test]
    fn test_category_keeps_registration_order() {
        let registry = ModuleRegistry::new();
        registry.register(command("work", &[], "economy"));
        registry.register(command("balance", &[], "economy"));
        registry.register(command("ping", &[], "utility"));

        let names: Vec<_> = registry
            .list_by_category("economy")
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["work", "balance"]);
        assert_eq!(registry.categories(), vec!["economy", "utility"]);
    }

    #[test]
    fn test_replace_with_renamed_descriptor() {
        let registry = ModuleRegistry::new();
        registry.register(command("colour", &["col"], "fun"));
        registry.replace("colour", command("color", &["clr"], "fun"));

        assert!(registry.lookup("colour").is_none());
        assert!(registry.lookup("col").is_none());
        assert_eq!(registry.lookup("clr").unwrap().name, "color");
    }

    #[test]
    fn test_rebuild_swaps_everything() {
        let registry = ModuleRegistry::new();
        registry.register(command("old", &["o"], "legacy"));
        registry.rebuild(vec![command("new", &["n"], "fresh")]);

        assert!(registry.lookup("old").is_none());
        assert!(registry.lookup("o").is_none());
        assert_eq!(registry.lookup("n").unwrap().name, "new");
        assert_eq!(registry.categories(), vec!["fresh"]);
    }

    #[test]
    fn test_held_snapshot_survives_replacement() {
        let registry = ModuleRegistry::new();
        registry.register(command("quote", &[], "fun").with_description("old"));
        let held = registry.lookup("quote").unwrap();

        registry.register(command("quote", &[], "fun").with_description("new"));

        assert_eq!(held.description.as_deref(), Some("old"));
        assert_eq!(
            registry.lookup("quote").unwrap().description.as_deref(),
            Some("new")
        );
    }
}
