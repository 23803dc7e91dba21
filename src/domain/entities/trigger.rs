use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Which ingestion surface a trigger came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Free-text message with a prefix
    Text,
    /// Schema-declared command delivered pre-parsed
    Structured,
}

impl Surface {
    pub fn as_str(&self) -> &str {
        match self {
            Surface::Text => "text",
            Surface::Structured => "structured",
        }
    }
}

/// Trigger arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    Words(Vec<String>),
    Options(BTreeMap<String, serde_json::Value>),
}

impl Arguments {
    pub fn words(&self) -> &[String] {
        match self {
            Arguments::Words(words) => words,
            Arguments::Options(_) => &[],
        }
    }

    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        match self {
            Arguments::Options(options) => options.get(name),
            Arguments::Words(_) => None,
        }
    }

    /// First positional word, or the first option's string value
    pub fn first(&self) -> Option<String> {
        match self {
            Arguments::Words(words) => words.first().cloned(),
            Arguments::Options(options) => options.values().next().map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }

    /// Arguments joined back into one line
    pub fn joined(&self) -> String {
        match self {
            Arguments::Words(words) => words.join(" "),
            Arguments::Options(options) => options
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => format!("{}:{}", k, s),
                    other => format!("{}:{}", k, other),
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Normalized inbound invocation
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: String,
    pub surface: Surface,
    pub invoker_id: String,
    pub channel_id: String,
    /// Community the channel belongs to; `None` in direct messages
    pub context_id: Option<String>,
    pub command: String,
    pub arguments: Arguments,
    pub received_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(
        surface: Surface,
        invoker_id: impl Into<String>,
        channel_id: impl Into<String>,
        command: impl Into<String>,
        arguments: Arguments,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            surface,
            invoker_id: invoker_id.into(),
            channel_id: channel_id.into(),
            context_id: None,
            command: command.into().to_lowercase(),
            arguments,
            received_at: Utc::now(),
        }
    }

    pub fn text(
        invoker_id: impl Into<String>,
        channel_id: impl Into<String>,
        command: impl Into<String>,
        words: Vec<String>,
    ) -> Self {
        Self::new(Surface::Text, invoker_id, channel_id, command, Arguments::Words(words))
    }

    pub fn structured(
        invoker_id: impl Into<String>,
        channel_id: impl Into<String>,
        command: impl Into<String>,
        options: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self::new(Surface::Structured, invoker_id, channel_id, command, Arguments::Options(options))
    }

    pub fn with_context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn with_context_opt(mut self, context_id: Option<String>) -> Self {
        self.context_id = context_id;
        self
    }

    pub fn is_direct(&self) -> bool {
        self.context_id.is_none()
    }
}
