//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Task store behavior
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How a failed task update is undone locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Reinstate only the previously cached task.
    #[default]
    Restore,
    /// Re-fetch the whole task collection.
    Refetch,
}

/// Task store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Rollback strategy for failed optimistic updates
    #[serde(default)]
    pub rollback: RollbackPolicy,
}

impl Config {
    /// Load configuration from a `.taskboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Err(crate::error::Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Locate the config file: `dir/.taskboard.toml`, then the user config dir.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        let local = dir.join(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        user_config_path().filter(|path| path.exists())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override the API base URL (from a flag or the environment).
    pub fn with_base_url(mut self, base_url: Option<String>) -> crate::error::Result<Self> {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url;
            self.validate()?;
        }
        Ok(self)
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.api.validate()
    }
}

/// `config.toml` inside the platform user config directory.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "taskboard")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl ApiConfig {
    fn validate(&self) -> crate::error::Result<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "api.base_url cannot be empty".to_string(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "api.base_url '{base_url}' must start with http:// or https://"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "api.timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.api.base_url, "http://localhost:3000");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.tasks.rollback, RollbackPolicy::Restore);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[api]
base_url = "https://board.example.com/api"
timeout_secs = 5

[tasks]
rollback = "refetch"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.api.base_url, "https://board.example.com/api");
        assert_eq!(cfg.api.timeout_secs, 5);
        assert_eq!(cfg.tasks.rollback, RollbackPolicy::Refetch);
    }

    #[test]
    fn invalid_base_url_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[api]\nbase_url = \"ftp://nope\"").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_timeout_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[api]\ntimeout_secs = 0").expect("write config");

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.api.base_url, "http://localhost:3000");
    }

    #[test]
    fn discover_prefers_local_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "").expect("write config");
        assert_eq!(Config::discover(dir.path()), Some(path));
    }

    #[test]
    fn with_base_url_validates_override() {
        let cfg = Config::default()
            .with_base_url(Some("https://api.example.com".to_string()))
            .expect("override");
        assert_eq!(cfg.api.base_url, "https://api.example.com");

        assert!(Config::default()
            .with_base_url(Some("localhost".to_string()))
            .is_err());
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("base_url = \"http://localhost:3000\""));
        assert!(written.contains("rollback = \"restore\""));
    }
}
