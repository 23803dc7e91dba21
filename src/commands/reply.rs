use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use crate::application::errors::HandlerError;
use crate::domain::entities::Trigger;
use crate::domain::traits::{CommandHandler, Invocation, Reply};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(user|channel|args|command)\}").expect("valid placeholder regex"));

/// Fill `{user}`, `{channel}`, `{args}` and `{command}`; other braces are left alone
pub fn render_template(template: &str, command: &str, trigger: &Trigger) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "user" => trigger.invoker_id.clone(),
            "channel" => trigger.channel_id.clone(),
            "args" => trigger.arguments.joined(),
            _ => command.to_string(),
        })
        .into_owned()
}

/// Answers with the unit's `response` template
pub struct ReplyCommand;

#[async_trait]
impl CommandHandler for ReplyCommand {
    async fn execute(&self, invocation: Invocation) -> Result<Reply, HandlerError> {
        let template = invocation.response.as_deref().ok_or_else(|| {
            HandlerError::ExecutionFailed(format!(
                "'{}' has no response template",
                invocation.command
            ))
        })?;
        Ok(Reply::new(render_template(
            template,
            &invocation.command,
            &invocation.trigger,
        )))
    }
}
