use crate::domain::entities::{Permissions, Trigger};

/// Platform view the dispatch gates consult.
///
/// Implementations answer from whatever cache the connector keeps; calls are
/// made synchronously from the gate sequence and must not block on I/O.
pub trait PermissionProbe: Send + Sync {
    /// Effective permissions of the invoker in the trigger's channel
    fn invoker_permissions(&self, trigger: &Trigger) -> Permissions;

    /// Effective permissions of the bot itself in the trigger's channel
    fn bot_permissions(&self, trigger: &Trigger) -> Permissions;

    /// Whether the channel permits age-restricted content
    fn allows_restricted_content(&self, trigger: &Trigger) -> bool;
}

/// Probe that answers with fixed values.
///
/// Used by the console adapter, where every caller is local.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    pub invoker: Permissions,
    pub bot: Permissions,
    pub restricted_content: bool,
}

impl StaticProbe {
    pub fn permissive() -> Self {
        Self {
            invoker: Permissions::all(),
            bot: Permissions::all(),
            restricted_content: true,
        }
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::permissive()
    }
}

impl PermissionProbe for StaticProbe {
    fn invoker_permissions(&self, _trigger: &Trigger) -> Permissions {
        self.invoker
    }

    fn bot_permissions(&self, _trigger: &Trigger) -> Permissions {
        self.bot
    }

    fn allows_restricted_content(&self, trigger: &Trigger) -> bool {
        // Direct messages carry no content rating
        self.restricted_content || trigger.is_direct()
    }
}
