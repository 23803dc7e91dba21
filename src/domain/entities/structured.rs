use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CommandPolicy;
use crate::domain::traits::CommandHandler;

/// Locale code -> localized text
pub type Localized = BTreeMap<String, String>;

/// Option kinds understood by the remote registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionKind {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionKind {
    /// Numeric type code used on the wire
    pub fn code(&self) -> u8 {
        match self {
            OptionKind::SubCommand => 1,
            OptionKind::SubCommandGroup => 2,
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, OptionKind::SubCommand | OptionKind::SubCommandGroup)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// One node of a structured command's option tree
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub localizations: Localizations,
}

/// Localized names and descriptions
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Localizations {
    #[serde(default)]
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
}

impl Localizations {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty()
    }
}

/// A schema-declared command mirrored to the remote registry.
#[derive(Clone)]
pub struct StructuredCommandDescriptor {
    pub name: String,
    pub description: String,
    pub localizations: Localizations,
    pub options: Vec<CommandOption>,
    pub policy: CommandPolicy,
    pub handler_key: String,
    pub response: Option<String>,
    pub handler: Arc<dyn CommandHandler>,
    pub source: Option<PathBuf>,
}

impl StructuredCommandDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        let name = name.into().to_lowercase();
        Self {
            handler_key: name.clone(),
            name,
            description: description.into(),
            localizations: Localizations::default(),
            options: Vec::new(),
            policy: CommandPolicy::default(),
            response: None,
            handler,
            source: None,
        }
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_localizations(mut self, localizations: Localizations) -> Self {
        self.localizations = localizations;
        self
    }

    pub fn with_policy(mut self, policy: CommandPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Debug for StructuredCommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredCommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options.len())
            .field("policy", &self.policy)
            .field("handler_key", &self.handler_key)
            .finish()
    }
}
