//! Trigger parser - Normalizes inbound invocations into triggers

use std::collections::BTreeMap;

use crate::domain::entities::Trigger;

/// Parses text messages and structured invocations into [`Trigger`]s
#[derive(Debug, Clone)]
pub struct TriggerParser {
    command_prefix: String,
    bot_id: Option<String>,
}

impl TriggerParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            bot_id: None,
        }
    }

    /// Also accept `<@bot_id>` / `<@!bot_id>` as a prefix
    pub fn with_bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    fn strip_prefix<'a>(&self, content: &'a str) -> Option<&'a str> {
        if !self.command_prefix.is_empty() {
            if let Some(rest) = content.strip_prefix(self.command_prefix.as_str()) {
                return Some(rest);
            }
        }
        let bot_id = self.bot_id.as_deref()?;
        [format!("<@{}>", bot_id), format!("<@!{}>", bot_id)]
            .iter()
            .find_map(|mention| content.strip_prefix(mention.as_str()))
    }

    /// Parse free text. Returns `None` for anything that isn't a command.
    pub fn parse_text(
        &self,
        raw_content: &str,
        author_id: impl Into<String>,
        channel_id: impl Into<String>,
        context_id: Option<String>,
    ) -> Option<Trigger> {
        let rest = self.strip_prefix(raw_content.trim_start())?;

        let mut parts = rest.split_whitespace();
        let name = parts.next()?;
        let args = parts.map(|s| s.to_string()).collect();

        Some(Trigger::text(author_id, channel_id, name, args).with_context_opt(context_id))
    }

    /// Normalize a pre-parsed structured invocation
    pub fn parse_structured(
        &self,
        command_name: &str,
        options: BTreeMap<String, serde_json::Value>,
        author_id: impl Into<String>,
        channel_id: impl Into<String>,
        context_id: Option<String>,
    ) -> Trigger {
        Trigger::structured(author_id, channel_id, command_name, options)
            .with_context_opt(context_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Arguments, Surface};

    #[test]
    fn test_parse_prefixed_command() {
        let parser = TriggerParser::new("!");
        let trigger = parser
            .parse_text("!Ban @someone spamming links", "1", "c1", Some("g1".to_string()))
            .unwrap();

        assert_eq!(trigger.surface, Surface::Text);
        assert_eq!(trigger.command, "ban");
        assert_eq!(trigger.arguments.words(), ["@someone", "spamming", "links"]);
        assert_eq!(trigger.context_id.as_deref(), Some("g1"));
    }

    #[test]
    fn test_plain_text_is_not_a_trigger() {
        let parser = TriggerParser::new("!");
        assert!(parser.parse_text("hello there", "1", "c1", None).is_none());
        assert!(parser.parse_text("!", "1", "c1", None).is_none());
        assert!(parser.parse_text("!   ", "1", "c1", None).is_none());
    }

    #[test]
    fn test_mention_prefix() {
        let parser = TriggerParser::new("!").with_bot_id("999");
        let trigger = parser.parse_text("<@!999> ping", "1", "c1", None).unwrap();
        assert_eq!(trigger.command, "ping");
        assert!(trigger.arguments.words().is_empty());

        let trigger = parser.parse_text("<@999>help economy", "1", "c1", None).unwrap();
        assert_eq!(trigger.command, "help");
        assert_eq!(trigger.arguments.words(), ["economy"]);
    }

    #[test]
    fn test_multi_char_prefix() {
        let parser = TriggerParser::new("gm.");
        let trigger = parser.parse_text("gm.work", "1", "c1", None).unwrap();
        assert_eq!(trigger.command, "work");
    }

    #[test]
    fn test_structured_keeps_options() {
        let parser = TriggerParser::new("!");
        let mut options = BTreeMap::new();
        options.insert("amount".to_string(), serde_json::json!(25));
        let trigger =
            parser.parse_structured("Convert", options, "1", "c1", Some("g1".to_string()));

        assert_eq!(trigger.surface, Surface::Structured);
        assert_eq!(trigger.command, "convert");
        assert!(matches!(trigger.arguments, Arguments::Options(_)));
        assert_eq!(trigger.arguments.option("amount"), Some(&serde_json::json!(25)));
    }
}
