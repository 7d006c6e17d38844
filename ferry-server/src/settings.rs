//! File and environment settings for hosts that mount from configuration

use crate::error::ConfigError;
use crate::options::{EngineOptions, MountOptions};
use ferry_core::{GlobSource, JsonStorage, MemoryStorage, MigrationSource, Storage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default listen address for the bundled server
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Storage backend named in settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageSettings {
    /// In-process, lost on restart
    #[default]
    Memory,
    /// JSON file of executed names
    Json {
        /// File location
        path: PathBuf,
    },
}

impl StorageSettings {
    /// Build the backend
    pub fn build(&self) -> Arc<dyn Storage> {
        match self {
            StorageSettings::Memory => Arc::new(MemoryStorage::new()),
            StorageSettings::Json { path } => Arc::new(JsonStorage::new(path)),
        }
    }
}

/// Serializable subset of the mount options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    /// Shared secret
    #[serde(default)]
    pub secret_key: String,

    /// Route prefix
    #[serde(default)]
    pub base_path: String,

    /// Listen address for the bundled server
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Migration file pattern; the engine default applies when unset
    #[serde(default)]
    pub migrations: Option<String>,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            base_path: String::new(),
            bind_address: default_bind_address(),
            migrations: None,
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Settings from a JSON document; the top level must be an object
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidSettings(e.to_string()))
    }

    /// Settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let value: toml::Value =
            toml::from_str(text).map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        let json =
            serde_json::to_value(value).map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        Self::from_value(json)
    }

    /// Read a settings file (`.json` as JSON, anything else as TOML)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        if is_json {
            let value: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
            Self::from_value(value)
        } else {
            Self::from_toml_str(&text)
        }
    }

    /// Apply `FERRY_SECRET_KEY`, `FERRY_BASE_PATH` and `BIND_ADDRESS`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secret) = lookup("FERRY_SECRET_KEY") {
            self.secret_key = secret;
        }
        if let Some(base) = lookup("FERRY_BASE_PATH") {
            self.base_path = base;
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        self
    }

    /// Mount options for `context`; validation happens in `mount`
    pub fn into_mount_options<C>(self, context: Arc<C>) -> MountOptions<C> {
        let mut engine = EngineOptions::new()
            .context(context)
            .storage(self.storage.build());
        if let Some(pattern) = self.migrations {
            engine = engine.migrations(MigrationSource::Glob(GlobSource::new(pattern)));
        }
        MountOptions::new(self.secret_key)
            .base_path(self.base_path)
            .engine(engine)
    }
}
