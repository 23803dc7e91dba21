//! Handler table - handler keys named by source units -> native handlers

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::traits::{AddonInitializer, CommandHandler, EventHandler};

/// Native handlers compiled into the binary, looked up by key.
///
/// Source units only name a key, so replacing a unit on disk swaps metadata
/// and routing without touching compiled code.
#[derive(Default, Clone)]
pub struct HandlerTable {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    events: HashMap<String, Arc<dyn EventHandler>>,
    addons: HashMap<String, Arc<dyn AddonInitializer>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with `reply`, `help`, `ping` and `reload`
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        crate::commands::register_builtins(&mut table);
        table
    }

    pub fn command<H: CommandHandler + 'static>(
        mut self,
        key: impl Into<String>,
        handler: H,
    ) -> Self {
        self.insert_command(key, Arc::new(handler));
        self
    }

    pub fn event<H: EventHandler + 'static>(mut self, key: impl Into<String>, handler: H) -> Self {
        self.insert_event(key, Arc::new(handler));
        self
    }

    pub fn addon<H: AddonInitializer + 'static>(
        mut self,
        key: impl Into<String>,
        handler: H,
    ) -> Self {
        self.insert_addon(key, Arc::new(handler));
        self
    }

    pub fn insert_command(&mut self, key: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.commands.insert(key.into().to_lowercase(), handler);
    }

    pub fn insert_event(&mut self, key: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.events.insert(key.into().to_lowercase(), handler);
    }

    pub fn insert_addon(&mut self, key: impl Into<String>, handler: Arc<dyn AddonInitializer>) {
        self.addons.insert(key.into().to_lowercase(), handler);
    }

    pub fn command_handler(&self, key: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.get(&key.to_lowercase()).cloned()
    }

    pub fn event_handler(&self, key: &str) -> Option<Arc<dyn EventHandler>> {
        self.events.get(&key.to_lowercase()).cloned()
    }

    pub fn addon_initializer(&self, key: &str) -> Option<Arc<dyn AddonInitializer>> {
        self.addons.get(&key.to_lowercase()).cloned()
    }

    pub fn command_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.commands.keys().cloned().collect();
        keys.sort();
        keys
    }
}
