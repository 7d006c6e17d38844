//! Mount options and their normalization into an engine configuration

use crate::auth::{SecretComparison, SecretKey};
use crate::error::ConfigError;
use ferry_core::{ConsoleLogger, EngineConfig, MigrationLogger, MigrationSource, Storage};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied engine settings; unset fields fall back to defaults
pub struct EngineOptions<C> {
    /// Handle passed to every migration. Required.
    pub context: Option<Arc<C>>,
    /// Executed-migrations log. Required.
    pub storage: Option<Arc<dyn Storage>>,
    /// Definitions; defaults to the `migrations/*.sql` glob
    pub migrations: Option<MigrationSource<C>>,
    /// Event sink; defaults to [`ConsoleLogger`]
    pub logger: Option<Arc<dyn MigrationLogger>>,
}

impl<C> Default for EngineOptions<C> {
    fn default() -> Self {
        Self {
            context: None,
            storage: None,
            migrations: None,
            logger: None,
        }
    }
}

impl<C> EngineOptions<C> {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context
    pub fn context(mut self, context: Arc<C>) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the storage backend
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the migration source
    pub fn migrations(mut self, migrations: impl Into<MigrationSource<C>>) -> Self {
        self.migrations = Some(migrations.into());
        self
    }

    /// Set the logger
    pub fn logger(mut self, logger: Arc<dyn MigrationLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

/// Everything `mount` needs
pub struct MountOptions<C> {
    /// Shared secret expected in `x-secret-key`. Must not be empty.
    pub secret_key: String,
    /// Prefix in front of `/migrations`
    pub base_path: Option<String>,
    /// Engine settings
    pub engine: EngineOptions<C>,
    /// Secret comparison mode
    pub secret_comparison: SecretComparison,
}

impl<C> MountOptions<C> {
    /// Options with a secret and default everything else
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_path: None,
            engine: EngineOptions::default(),
            secret_comparison: SecretComparison::default(),
        }
    }

    /// Mount routes under `base_path`
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Engine settings
    pub fn engine(mut self, engine: EngineOptions<C>) -> Self {
        self.engine = engine;
        self
    }

    /// Comparison mode for the secret
    pub fn secret_comparison(mut self, comparison: SecretComparison) -> Self {
        self.secret_comparison = comparison;
        self
    }
}

impl<C> fmt::Debug for MountOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountOptions")
            .field("base_path", &self.base_path)
            .field("secret_comparison", &self.secret_comparison)
            .finish_non_exhaustive()
    }
}

/// Result of normalization
pub struct Normalized<C> {
    /// Complete engine configuration
    pub config: EngineConfig<C>,
    /// Secret for the authorization gate
    pub secret: SecretKey,
    /// Normalized prefix, empty or starting with `/`
    pub base_path: String,
}

/// Merge options with defaults and check required fields
pub fn normalize<C>(options: MountOptions<C>) -> Result<Normalized<C>, ConfigError> {
    let MountOptions {
        secret_key,
        base_path,
        engine,
        secret_comparison,
    } = options;

    if secret_key.is_empty() {
        return Err(ConfigError::SecretKeyRequired);
    }
    let context = engine.context.ok_or(ConfigError::ContextRequired)?;
    let storage = engine.storage.ok_or(ConfigError::StorageRequired)?;

    let config = EngineConfig {
        context,
        storage,
        migrations: engine.migrations.unwrap_or_default(),
        logger: engine.logger.unwrap_or_else(|| Arc::new(ConsoleLogger)),
    };

    Ok(Normalized {
        config,
        secret: SecretKey::with_comparison(secret_key, secret_comparison),
        base_path: normalize_base_path(base_path.as_deref().unwrap_or("")),
    })
}

/// Empty stays empty; otherwise one leading `/` and no trailing `/`
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
