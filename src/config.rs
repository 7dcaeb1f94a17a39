//! Configuration loader and validator for the content checker.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONTENT_URL: &str = "http://api.ft.com/content";
pub const DEFAULT_NOTIFICATIONS_URL: &str = "http://api.ft.com/content/notifications";
pub const DEFAULT_OUTPUT: &str = "up-content-check.csv";
pub const DEFAULT_WORKERS: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api: Api,
    pub app: App,
}

/// Remote endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Api {
    pub content_url: String,
    pub notifications_url: String,
    /// `user:password`; empty disables basic auth.
    pub auth: String,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            content_url: DEFAULT_CONTENT_URL.to_string(),
            notifications_url: DEFAULT_NOTIFICATIONS_URL.to_string(),
            auth: String::new(),
        }
    }
}

/// Run settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub workers: usize,
    pub request_timeout_secs: u64,
    pub output: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            request_timeout_secs: 30,
            output: DEFAULT_OUTPUT.to_string(),
        }
    }
}

/// Basic-auth pair split out of `api.auth`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn credentials(&self) -> Option<Credentials> {
        let (user, password) = self.api.auth.split_once(':')?;
        Some(Credentials {
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    /// `None` when the timeout is disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.app.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.content_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.content_url must be non-empty"));
    }
    if Url::parse(&cfg.api.content_url).is_err() {
        return Err(ConfigError::Invalid("api.content_url must be a valid URL"));
    }
    if cfg.api.notifications_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.notifications_url must be non-empty"));
    }
    if Url::parse(&cfg.api.notifications_url).is_err() {
        return Err(ConfigError::Invalid("api.notifications_url must be a valid URL"));
    }
    if !cfg.api.auth.is_empty() && !cfg.api.auth.contains(':') {
        return Err(ConfigError::Invalid("api.auth must look like user:password"));
    }

    if cfg.app.workers == 0 {
        return Err(ConfigError::Invalid("app.workers must be > 0"));
    }
    if cfg.app.output.trim().is_empty() {
        return Err(ConfigError::Invalid("app.output must be non-empty"));
    }

    Ok(())
}

/// Example YAML documenting every key and its default.
pub fn example() -> &'static str {
    r#"api:
  content_url: "http://api.ft.com/content"
  notifications_url: "http://api.ft.com/content/notifications"
  auth: ""

app:
  workers: 5
  request_timeout_secs: 30
  output: "up-content-check.csv"
"#
}
