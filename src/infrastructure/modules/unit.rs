//! Source unit definitions
//!
//! The on-disk shapes of command, structured command, event and addon units.
//! Every field is optional at the serde level so a missing name surfaces as a
//! shape error for that unit instead of an opaque parse failure.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::errors::LoadError;
use crate::domain::entities::{CommandOption, Localizations};

/// Text-triggered command unit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CommandUnit {
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub usage: Option<String>,
    /// Seconds
    pub cooldown: Option<u64>,
    pub owner: bool,
    pub maintenance: bool,
    pub nsfw: bool,
    pub permissions: Vec<String>,
    #[serde(rename = "botpermissions", alias = "bot-permissions")]
    pub bot_permissions: Vec<String>,
    /// Handler key
    pub execute: Option<String>,
    /// Reply template for the built-in `reply` handler
    pub response: Option<String>,
}

/// Structured (schema-declared) command unit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StructuredUnit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub localizations: Localizations,
    pub options: Vec<CommandOption>,
    pub cooldown: Option<u64>,
    pub owner: bool,
    pub maintenance: bool,
    pub nsfw: bool,
    pub permissions: Vec<String>,
    #[serde(rename = "botpermissions", alias = "bot-permissions")]
    pub bot_permissions: Vec<String>,
    pub execute: Option<String>,
    pub response: Option<String>,
}

/// Event binding unit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EventUnit {
    pub event: Option<String>,
    pub once: bool,
    /// Handler key; defaults to the event name
    pub run: Option<String>,
}

/// Addon unit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AddonUnit {
    pub structure: Option<AddonStructure>,
    /// Initializer key; defaults to the addon name
    pub initialize: Option<String>,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AddonStructure {
    pub name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub version: Option<String>,
    pub author: Option<String>,
    /// Required permission bitfield
    pub bitfield: Option<u64>,
}

/// `version: 1.0` arrives as a float from YAML; keep it as text
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Read and deserialize a unit; JSON by extension, YAML otherwise
pub fn read_unit<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_unit(path, &content)
}

pub fn parse_unit<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, LoadError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let parsed = if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OptionKind;

    #[test]
    fn test_command_unit_yaml() {
        let yaml = r#"
name: ban
aliases: [b, hammer]
description: Ban a member
cooldown: 5
permissions: [ban-members]
botpermissions: [BAN_MEMBERS]
"#;
        let unit: CommandUnit = parse_unit(Path::new("ban.yaml"), yaml).unwrap();
        assert_eq!(unit.name.as_deref(), Some("ban"));
        assert_eq!(unit.aliases, vec!["b", "hammer"]);
        assert_eq!(unit.cooldown, Some(5));
        assert_eq!(unit.bot_permissions, vec!["BAN_MEMBERS"]);
        assert!(!unit.owner);
    }

    #[test]
    fn test_command_unit_json() {
        let json = r#"{"name": "ping", "owner": true, "response": "Pong!"}"#;
        let unit: CommandUnit = parse_unit(Path::new("ping.json"), json).unwrap();
        assert!(unit.owner);
        assert_eq!(unit.response.as_deref(), Some("Pong!"));
    }

    #[test]
    fn test_nameless_unit_still_parses() {
        let unit: CommandUnit = parse_unit(Path::new("x.yaml"), "description: orphan").unwrap();
        assert!(unit.name.is_none());
    }

    #[test]
    fn test_structured_unit_with_options() {
        let yaml = r#"
name: convert
description: Convert currency
localizations:
  description:
    de: Währung umrechnen
options:
  - type: number
    name: amount
    description: How much
    required: true
  - type: string
    name: to
    description: Target currency
    choices:
      - name: Euro
        value: EUR
"#;
        let unit: StructuredUnit = parse_unit(Path::new("convert.yaml"), yaml).unwrap();
        assert_eq!(unit.options.len(), 2);
        assert_eq!(unit.options[0].kind, OptionKind::Number);
        assert!(unit.options[0].required);
        assert_eq!(unit.options[1].choices[0].value, serde_json::json!("EUR"));
        assert_eq!(unit.localizations.description["de"], "Währung umrechnen");
    }

    #[test]
    fn test_addon_unit() {
        let yaml = r#"
structure:
  name: reminders
  version: 1.2.0
  author: ops
  bitfield: 2048
config:
  interval-secs: 60
"#;
        let unit: AddonUnit = parse_unit(Path::new("reminders.yaml"), yaml).unwrap();
        let structure = unit.structure.unwrap();
        assert_eq!(structure.version.as_deref(), Some("1.2.0"));
        assert_eq!(structure.bitfield, Some(2048));
        assert_eq!(unit.config["interval-secs"], 60);
    }

    #[test]
    fn test_numeric_addon_version() {
        let unit: AddonUnit =
            parse_unit(Path::new("a.yaml"), "structure: {name: a, version: 2.5}").unwrap();
        assert_eq!(unit.structure.unwrap().version.as_deref(), Some("2.5"));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = parse_unit::<CommandUnit>(Path::new("bad.yaml"), "name: [unclosed").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
