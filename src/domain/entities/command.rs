use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::Permissions;
use crate::domain::traits::CommandHandler;

/// Flags that gate who may run a command and where
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandFlags {
    pub owner_only: bool,
    pub maintenance: bool,
    pub nsfw_only: bool,
}

/// Everything the dispatch gates look at, shared by text and structured commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPolicy {
    pub permissions: Permissions,
    pub bot_permissions: Permissions,
    pub cooldown: Option<Duration>,
    pub flags: CommandFlags,
}

impl CommandPolicy {
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.flags.owner_only = true;
        self
    }

    pub fn maintenance(mut self) -> Self {
        self.flags.maintenance = true;
        self
    }

    pub fn nsfw_only(mut self) -> Self {
        self.flags.nsfw_only = true;
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions = permissions;
        self
    }
}

/// A registered text-triggered command.
///
/// Descriptors are immutable once built. Reloading produces a new descriptor
/// and swaps the `Arc` in the registry; a dispatch that already resolved the
/// old one finishes against it.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub category: String,
    pub policy: CommandPolicy,
    /// Key the handler was resolved from
    pub handler_key: String,
    /// Template rendered by the `reply` handler
    pub response: Option<String>,
    pub handler: Arc<dyn CommandHandler>,
    pub source: Option<PathBuf>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        let name = name.into().to_lowercase();
        Self {
            handler_key: name.clone(),
            name,
            aliases: Vec::new(),
            description: None,
            usage: None,
            category: "general".to_string(),
            policy: CommandPolicy::default(),
            response: None,
            handler,
            source: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases.into_iter().map(|a| a.to_lowercase()).collect();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_policy(mut self, policy: CommandPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_handler_key(mut self, key: impl Into<String>) -> Self {
        self.handler_key = key.into();
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name == input_lower || self.aliases.iter().any(|a| *a == input_lower)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("policy", &self.policy)
            .field("handler_key", &self.handler_key)
            .field("source", &self.source)
            .finish()
    }
}
