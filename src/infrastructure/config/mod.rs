//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub modules: ModulesConfig,
    pub dispatch: DispatchConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    /// User ids allowed through owner-only and maintenance gates
    pub owners: Vec<String>,
    /// Bot user id; enables `<@id> command` mentions as a prefix
    pub bot_id: Option<String>,
}

/// Where source units live
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ModulesConfig {
    pub commands: PathBuf,
    pub slash: PathBuf,
    pub events: PathBuf,
    pub addons: PathBuf,
    /// Allow-listed file extensions, without the dot
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DispatchConfig {
    /// 0 disables the timeout
    pub handler_timeout_secs: u64,
    /// Reject every non-owner invocation
    pub maintenance: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub api_base: String,
    pub application_id: Option<String>,
    pub token: Option<String>,
    /// Deploy to one guild instead of globally (faster propagation while developing)
    pub guild_id: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "botcore".to_string(),
            prefix: "!".to_string(),
            owners: Vec::new(),
            bot_id: None,
        }
    }
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            commands: PathBuf::from("./modules/commands"),
            slash: PathBuf::from("./modules/slash"),
            events: PathBuf::from("./modules/events"),
            addons: PathBuf::from("./modules/addons"),
            extensions: vec!["yaml".to_string(), "yml".to_string(), "json".to_string()],
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handler_timeout_secs: 30,
            maintenance: false,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: "https://discord.com/api/v10".to_string(),
            application_id: None,
            token: None,
            guild_id: None,
        }
    }
}

impl DispatchConfig {
    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_secs > 0).then(|| Duration::from_secs(self.handler_timeout_secs))
    }
}

impl ModulesConfig {
    /// Whether `path` has an allow-listed extension
    pub fn is_allowed(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Credentials needed to reach the remote registry
#[derive(Debug, Clone)]
pub struct RemoteCredentials {
    pub api_base: String,
    pub application_id: String,
    pub token: String,
    pub guild_id: Option<String>,
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.remote.token = Some(token);
        }

        if let Ok(app_id) = std::env::var("BOT_APPLICATION_ID") {
            self.remote.application_id = Some(app_id);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(owners) = std::env::var("BOT_OWNERS") {
            self.bot.owners = owners
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    /// Check if a user ID is a bot owner
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.bot.owners.iter().any(|o| o == user_id)
    }

    /// Credentials for the remote registry; missing ones are fatal at startup
    pub fn validate_remote(&self) -> Result<RemoteCredentials, ConfigError> {
        let token = self
            .remote
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("remote.token (or BOT_TOKEN)".to_string()))?;
        let application_id = self
            .remote
            .application_id
            .clone()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingField(
                    "remote.application-id (or BOT_APPLICATION_ID)".to_string(),
                )
            })?;
        if application_id.parse::<u64>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "remote.application-id must be numeric, got '{}'",
                application_id
            )));
        }
        Ok(RemoteCredentials {
            api_base: self.remote.api_base.trim_end_matches('/').to_string(),
            application_id,
            token,
            guild_id: self.remote.guild_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
bot:
  prefix: "?"
  owners: ["42"]
dispatch:
  handler-timeout-secs: 0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bot.prefix, "?");
        assert_eq!(config.bot.name, "botcore");
        assert!(config.is_owner("42"));
        assert!(config.dispatch.handler_timeout().is_none());
        assert_eq!(config.modules.extensions, vec!["yaml", "yml", "json"]);
    }

    #[test]
    fn test_missing_credentials_are_reported() {
        let mut config = Config::default();
        assert!(matches!(config.validate_remote(), Err(ConfigError::MissingField(_))));

        config.remote.token = Some("secret".to_string());
        config.remote.application_id = Some("not-a-number".to_string());
        assert!(matches!(config.validate_remote(), Err(ConfigError::InvalidValue(_))));

        config.remote.application_id = Some("1234".to_string());
        let creds = config.validate_remote().unwrap();
        assert_eq!(creds.application_id, "1234");
        assert_eq!(creds.api_base, "https://discord.com/api/v10");
    }

    #[test]
    fn test_extension_allow_list() {
        let modules = ModulesConfig::default();
        assert!(modules.is_allowed(std::path::Path::new("ping.yaml")));
        assert!(modules.is_allowed(std::path::Path::new("ping.JSON")));
        assert!(!modules.is_allowed(std::path::Path::new("ping.rs")));
        assert!(!modules.is_allowed(std::path::Path::new("README")));
    }
}
