//! Configuration loading and management
//!
//! Handles parsing of `task-cli.toml` configuration files:
//!
//! ```toml
//! [json.file]
//! path = "tasks.json"
//! pretty = true
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Name of the per-directory configuration file
pub const CONFIG_FILE: &str = "task-cli.toml";

/// Property naming the task document path
pub const DOCUMENT_PATH_KEY: &str = "json.file.path";

/// Property selecting pretty-printed documents
pub const DOCUMENT_PRETTY_KEY: &str = "json.file.pretty";

/// Read-only key/value view of configuration.
pub trait ConfigSource {
    fn get_property(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get_property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// JSON document settings
    #[serde(default)]
    pub json: JsonConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonConfig {
    #[serde(default)]
    pub file: DocumentConfig,
}

/// Task document configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Path of the task document
    #[serde(default = "default_document_path")]
    pub path: String,

    /// Pretty-print the document
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_document_path() -> String {
    "tasks.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
            pretty: default_true(),
        }
    }
}

impl ConfigSource for Config {
    fn get_property(&self, key: &str) -> Option<String> {
        match key {
            DOCUMENT_PATH_KEY => Some(self.json.file.path.clone()),
            DOCUMENT_PRETTY_KEY => Some(self.json.file.pretty.to_string()),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find and load the configuration.
    ///
    /// An explicit path must exist. Otherwise `./task-cli.toml` is tried, then
    /// the user configuration directory, then built-in defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local = cwd.join(CONFIG_FILE);
        if local.is_file() {
            tracing::debug!(path = %local.display(), "using local config");
            return Self::load(&local);
        }

        if let Some(user) = user_config_path().filter(|path| path.is_file()) {
            tracing::debug!(path = %user.display(), "using user config");
            return Self::load(&user);
        }

        Ok(Self::default())
    }

    /// Override the document path, e.g. from `--file`.
    pub fn with_document_path(mut self, path: impl Into<String>) -> Self {
        self.json.file.path = path.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.json.file.path.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "{DOCUMENT_PATH_KEY} cannot be empty"
            )));
        }
        Ok(())
    }
}

/// `config.toml` in the platform configuration directory for task-cli
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "task-cli")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
