use async_trait::async_trait;

use crate::application::errors::HandlerError;
use crate::domain::entities::CommandDescriptor;
use crate::domain::traits::{CommandHandler, Invocation, Reply};

/// Lists commands by category, or shows one command in detail
pub struct HelpCommand;

fn detail(prefix: &str, cmd: &CommandDescriptor) -> String {
    let mut help = format!(
        "{}{} - {}",
        prefix,
        cmd.name,
        cmd.description.as_deref().unwrap_or("No description")
    );
    if let Some(usage) = &cmd.usage {
        help.push_str(&format!("\nUsage: {}", usage));
    }
    if !cmd.aliases.is_empty() {
        help.push_str(&format!("\nAliases: {}", cmd.aliases.join(", ")));
    }
    if let Some(cooldown) = cmd.policy.cooldown {
        help.push_str(&format!("\nCooldown: {}s", cooldown.as_secs()));
    }
    if !cmd.policy.permissions.is_empty() {
        help.push_str(&format!("\nRequires: {}", cmd.policy.permissions));
    }
    help
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn execute(&self, invocation: Invocation) -> Result<Reply, HandlerError> {
        let registry = &invocation.runtime.registry;
        let prefix = &invocation.runtime.config.bot.prefix;

        if let Some(name) = invocation.trigger.arguments.first() {
            return Ok(match registry.lookup(&name) {
                Some(cmd) => Reply::new(detail(prefix, &cmd)),
                None => Reply::ephemeral(format!("Command {}{} not found", prefix, name)),
            });
        }

        let mut help = "Available commands:\n".to_string();
        for category in registry.categories() {
            // Owner-only commands stay out of the public listing
            let visible: Vec<_> = registry
                .list_by_category(&category)
                .into_iter()
                .filter(|c| !c.policy.flags.owner_only)
                .collect();
            if visible.is_empty() {
                continue;
            }
            help.push_str(&format!("\n[{}]\n", category));
            for cmd in visible {
                help.push_str(&format!(
                    "  {}{} - {}\n",
                    prefix,
                    cmd.name,
                    cmd.description.as_deref().unwrap_or("")
                ));
            }
        }
        Ok(Reply::new(help.trim_end()))
    }
}
