use async_trait::async_trait;

use crate::application::errors::HandlerError;
use crate::domain::traits::{CommandHandler, Invocation, Reply};

pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    async fn execute(&self, _invocation: Invocation) -> Result<Reply, HandlerError> {
        Ok(Reply::new("Pong!"))
    }
}

/// Operator reload: no argument or `all` reloads everything, otherwise one command
pub struct ReloadCommand;

#[async_trait]
impl CommandHandler for ReloadCommand {
    async fn execute(&self, invocation: Invocation) -> Result<Reply, HandlerError> {
        let reloader = &invocation.runtime.reloader;
        let target = invocation.trigger.arguments.first();

        let reply = match target.as_deref() {
            None | Some("all") => match reloader.reload_all().await {
                Ok(report) if report.skipped.is_empty() => Reply::new(format!(
                    "Reloaded {} commands and {} structured commands.",
                    report.commands.len(),
                    report.structured.len()
                )),
                Ok(report) => Reply::new(format!(
                    "Reloaded {} commands and {} structured commands; skipped {} (see logs).",
                    report.commands.len(),
                    report.structured.len(),
                    report.skipped.len()
                )),
                Err(e) => Reply::ephemeral(format!("Reload failed: {}", e)),
            },
            Some(name) => match reloader.reload_one(name).await {
                Ok(report) => {
                    let mut names = report.commands.clone();
                    names.extend(report.structured.iter().map(|n| format!("/{}", n)));
                    Reply::new(format!("Reloaded {}.", names.join(", ")))
                }
                Err(e) => Reply::ephemeral(format!("Reload failed: {}", e)),
            },
        };
        Ok(reply)
    }
}
