//! Built-in command handlers, bound by key from source units

mod help;
mod reply;
mod system;

pub use help::HelpCommand;
pub use reply::{render_template, ReplyCommand};
pub use system::{PingCommand, ReloadCommand};

use crate::application::handlers::HandlerTable;

/// Register `reply`, `help`, `ping` and `reload`
pub fn register_builtins(table: &mut HandlerTable) {
    use std::sync::Arc;

    table.insert_command("reply", Arc::new(ReplyCommand));
    table.insert_command("help", Arc::new(HelpCommand));
    table.insert_command("ping", Arc::new(PingCommand));
    table.insert_command("reload", Arc::new(ReloadCommand));
}
