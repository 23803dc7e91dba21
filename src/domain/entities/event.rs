use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::traits::EventHandler;

/// A platform event bound to a handler at load time
#[derive(Clone)]
pub struct EventBinding {
    pub event: String,
    pub once: bool,
    pub handler_key: String,
    pub handler: Arc<dyn EventHandler>,
    pub source: Option<PathBuf>,
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event", &self.event)
            .field("once", &self.once)
            .field("handler_key", &self.handler_key)
            .finish()
    }
}
