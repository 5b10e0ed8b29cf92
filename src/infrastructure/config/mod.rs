//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Chat configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub chat: ChatConfig,
    pub directory: DirectoryConfig,
    pub dispatcher: DispatcherConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChatConfig {
    pub name: String,
    pub prefix: String,
}

/// Credential file settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DirectoryConfig {
    pub path: PathBuf,
    /// Truncate the credential file when the process exits
    #[serde(default)]
    pub clear_on_exit: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DispatcherConfig {
    pub delivery_timeout_ms: u64,
}

impl DispatcherConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat: ChatConfig {
                name: "chat-relay".to_string(),
                prefix: "/".to_string(),
            },
            directory: DirectoryConfig {
                path: PathBuf::from("users.txt"),
                clear_on_exit: false,
            },
            dispatcher: DispatcherConfig {
                delivery_timeout_ms: 500,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.prefix.is_empty() {
            return Err(ConfigError::MissingField("chat.prefix".to_string()));
        }
        if self.directory.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("directory.path".to_string()));
        }
        if self.dispatcher.delivery_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "dispatcher.delivery-timeout-ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `CHAT_*` environment variables
    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("CHAT_USERS_FILE") {
            config.directory.path = PathBuf::from(path);
        }

        if let Ok(prefix) = std::env::var("CHAT_PREFIX") {
            if !prefix.is_empty() {
                config.chat.prefix = prefix;
            }
        }

        if let Ok(timeout) = std::env::var("CHAT_DELIVERY_TIMEOUT_MS") {
            match parse_timeout(&timeout) {
                Ok(ms) => config.dispatcher.delivery_timeout_ms = ms,
                Err(e) => tracing::warn!("Ignoring CHAT_DELIVERY_TIMEOUT_MS: {}", e),
            }
        }

        config
    }
}

fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(ConfigError::InvalidValue(format!("not a positive number: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("delivery-timeout-ms: 500"));
        assert!(yaml.contains("clear-on-exit: false"));

        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.chat.prefix, "/");
        assert_eq!(config.dispatcher.delivery_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_clear_on_exit_optional() {
        let yaml = "chat:\n  name: test\n  prefix: '!'\ndirectory:\n  path: accounts.txt\ndispatcher:\n  delivery-timeout-ms: 50\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(!config.directory.clear_on_exit);
        assert_eq!(config.directory.path, PathBuf::from("accounts.txt"));
        assert_eq!(config.chat.prefix, "!");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = "chat:\n  name: test\n  prefix: ''\ndirectory:\n  path: a.txt\ndispatcher:\n  delivery-timeout-ms: 50\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::MissingField(_))));

        let yaml = "chat:\n  name: test\n  prefix: '/'\ndirectory:\n  path: a.txt\ndispatcher:\n  delivery-timeout-ms: 0\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::InvalidValue(_))));

        assert!(matches!(Config::from_yaml("chat: ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(" 250 ").unwrap(), 250);
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }
}
