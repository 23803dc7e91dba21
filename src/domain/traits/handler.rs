use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::HandlerError;
use crate::application::runtime::RuntimeContext;
use crate::domain::entities::Trigger;

/// What a command handler gets to work with
#[derive(Clone)]
pub struct Invocation {
    pub trigger: Trigger,
    /// Canonical name the trigger resolved to (never an alias)
    pub command: String,
    /// The descriptor's `response` template, if any
    pub response: Option<String>,
    pub runtime: Arc<RuntimeContext>,
}

/// Message sent back to the invoker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Only visible to the invoker where the platform supports it
    pub ephemeral: bool,
}

impl Reply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

/// Native command implementation bound to a handler key
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, invocation: Invocation) -> Result<Reply, HandlerError>;
}

/// Listener for a platform event
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn run(&self, event: &str, payload: serde_json::Value) -> Result<(), HandlerError>;
}

/// Addon entry point, invoked once with the live runtime
#[async_trait]
pub trait AddonInitializer: Send + Sync {
    async fn initialize(
        &self,
        runtime: Arc<RuntimeContext>,
        config: serde_json::Value,
    ) -> Result<(), HandlerError>;
}
