use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, CoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub collection: CollectionConfig,
    /// Extra keyword -> community mappings used by the fallback strategy.
    pub communities: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: "pulse/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pulse.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub workers: usize,
    pub default_limit: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            default_limit: 100,
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file (when present), then environment overrides.
    ///
    /// An explicitly given path must exist; without one, `pulse.toml` in the
    /// working directory is read if it is there.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Some(path) => Self::from_file(path)?,
            None if Path::new("pulse.toml").exists() => Self::from_file(Path::new("pulse.toml"))?,
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        debug!("Reading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Applies environment-style overrides; `lookup` returns the value of a variable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REDDIT_CLIENT_ID") {
            self.reddit.client_id = value;
        }
        if let Some(value) = lookup("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = value;
        }
        if let Some(value) = lookup("REDDIT_USER_AGENT") {
            self.reddit.user_agent = value;
        }
        if let Some(value) = lookup("PULSE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = lookup("PULSE_HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("PULSE_PORT") {
            self.server.port = parse_number("PULSE_PORT", &value)?;
        }
        if let Some(value) = lookup("PULSE_WORKERS") {
            self.collection.workers = parse_number("PULSE_WORKERS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.reddit.client_id.trim().is_empty() {
            return Err(missing("reddit.client_id"));
        }
        if self.reddit.client_secret.trim().is_empty() {
            return Err(missing("reddit.client_secret"));
        }
        if self.reddit.user_agent.trim().is_empty() {
            return Err(missing("reddit.user_agent"));
        }
        if self.collection.workers == 0 {
            return Err(invalid("collection.workers", "0"));
        }
        if self.collection.default_limit == 0 {
            return Err(invalid("collection.default_limit", "0"));
        }
        if self.server.port == 0 {
            return Err(invalid("server.port", "0"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CoreError> {
    value.trim().parse().map_err(|_| invalid(field, value))
}

fn missing(field: &str) -> CoreError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
    .into()
}

fn invalid(field: &str, value: &str) -> CoreError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}
