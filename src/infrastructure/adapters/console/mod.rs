//! Console adapter for development/testing
//!
//! Lines starting with the configured prefix go through the text surface.
//! Lines starting with `/` go through the structured surface, with
//! `key:value` words as options.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::engine::Engine;
use crate::application::errors::BotError;
use crate::domain::traits::{Bot, BotInfo, Reply};

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    user_id: String,
    channel_id: String,
    context_id: Option<String>,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: name.into(),
                username: "console".to_string(),
            },
            user_id: "console".to_string(),
            channel_id: "console".to_string(),
            context_id: Some("console".to_string()),
        }
    }

    /// Act as `user_id`, e.g. a configured owner
    pub fn as_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Behave like a direct-message channel
    pub fn direct(mut self) -> Self {
        self.context_id = None;
        self
    }

    /// Read stdin until EOF, dispatching each command line on its own task
    pub async fn run(self: Arc<Self>, engine: Arc<Engine>) -> Result<(), BotError> {
        self.start().await?;
        let info = self.bot_info();
        tracing::info!(
            "Bot started: @{} (prefix '{}', Ctrl-D to quit)",
            info.username,
            engine.parser().prefix()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let adapter = Arc::clone(&self);
            let engine = Arc::clone(&engine);
            let line = line.to_string();
            tokio::spawn(async move {
                adapter.dispatch_line(&engine, &line).await;
            });
        }

        tracing::info!("Console closed");
        Ok(())
    }

    async fn dispatch_line(&self, engine: &Engine, line: &str) {
        let outcome = match parse_structured_line(line, engine.parser().prefix()) {
            Some((name, options)) => Some(
                engine
                    .handle_structured(
                        &name,
                        options,
                        &self.user_id,
                        &self.channel_id,
                        self.context_id.clone(),
                    )
                    .await,
            ),
            None => {
                engine
                    .handle_text(line, &self.user_id, &self.channel_id, self.context_id.clone())
                    .await
            }
        };

        let Some(reply) = outcome.and_then(|o| o.reply()) else {
            return;
        };
        if let Err(e) = self.send_reply(&self.channel_id, &reply).await {
            tracing::warn!("Failed to send reply: {}", e);
        }
    }
}

/// `/name key:value ...` as a structured invocation; `None` when the line
/// isn't one (or `/` is the text prefix)
fn parse_structured_line(
    line: &str,
    text_prefix: &str,
) -> Option<(String, BTreeMap<String, serde_json::Value>)> {
    if text_prefix == "/" {
        return None;
    }
    let rest = line.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();

    let options = parts
        .filter_map(|part| part.split_once(':'))
        .map(|(key, raw)| {
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
            (key.to_string(), value)
        })
        .collect();
    Some((name, options))
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_reply(&self, _channel_id: &str, reply: &Reply) -> Result<String, BotError> {
        if reply.ephemeral {
            println!("[BOT] (only you) {}", reply.content);
        } else {
            println!("[BOT] {}", reply.content);
        }
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
