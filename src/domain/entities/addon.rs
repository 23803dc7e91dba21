use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::Permissions;
use crate::domain::traits::AddonInitializer;

/// Addon metadata plus the initializer invoked once at startup
#[derive(Clone)]
pub struct AddonDescriptor {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub permissions: Permissions,
    pub config: serde_json::Value,
    pub initializer: Arc<dyn AddonInitializer>,
    pub source: Option<PathBuf>,
}

impl fmt::Debug for AddonDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("author", &self.author)
            .field("permissions", &self.permissions)
            .finish()
    }
}
