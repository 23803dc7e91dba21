use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::application::errors::SyncError;
use crate::domain::entities::{CommandOption, Localized, OptionChoice, StructuredCommandDescriptor};

/// One structured command as the remote registry expects it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteCommand {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Localized::is_empty")]
    pub name_localizations: Localized,
    #[serde(skip_serializing_if = "Localized::is_empty")]
    pub description_localizations: Localized,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<RemoteOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<RemoteOption>,
    #[serde(skip_serializing_if = "Localized::is_empty")]
    pub name_localizations: Localized,
    #[serde(skip_serializing_if = "Localized::is_empty")]
    pub description_localizations: Localized,
}

impl From<&CommandOption> for RemoteOption {
    fn from(option: &CommandOption) -> Self {
        Self {
            kind: option.kind.code(),
            name: option.name.clone(),
            description: option.description.clone(),
            // The remote side rejects `required` on sub-command nodes
            required: option.required && !option.kind.is_group(),
            choices: option.choices.clone(),
            options: option.options.iter().map(RemoteOption::from).collect(),
            name_localizations: option.localizations.name.clone(),
            description_localizations: option.localizations.description.clone(),
        }
    }
}

impl From<&StructuredCommandDescriptor> for RemoteCommand {
    fn from(descriptor: &StructuredCommandDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            name_localizations: descriptor.localizations.name.clone(),
            description_localizations: descriptor.localizations.description.clone(),
            options: descriptor.options.iter().map(RemoteOption::from).collect(),
        }
    }
}

/// Rate-limit feedback observed on the administrative connection
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitNotice {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset_after: Option<Duration>,
    pub bucket: Option<String>,
    pub global: bool,
}

/// Administrative endpoint holding the platform's structured commands.
///
/// The remote side only supports whole-set replacement.
#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    /// Replace every registered structured command with `commands`.
    /// Returns how many commands the remote side acknowledged.
    async fn replace_all(&self, commands: &[RemoteCommand]) -> Result<usize, SyncError>;
}
