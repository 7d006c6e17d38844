//! Migration definitions

use crate::error::{BoxError, FerryError, Result};
use crate::engine::MigrationMeta;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context handed to every migration procedure.
///
/// The context is caller-defined (a connection pool, a client, a
/// test recorder). Only script migrations need `run_script`; contexts
/// that never run scripts can rely on the default, which refuses.
#[async_trait]
pub trait MigrationContext: Send + Sync + 'static {
    /// Execute the body of a script migration
    async fn run_script(&self, name: &str, script: &str) -> std::result::Result<(), BoxError> {
        let _ = script;
        Err(format!("context cannot execute script migration \"{}\"", name).into())
    }
}

/// Forward and backward procedures of one migration
#[async_trait]
pub trait MigrationStep<C>: Send + Sync {
    /// Apply the migration
    async fn up(&self, ctx: &C) -> std::result::Result<(), BoxError>;

    /// Revert the migration
    async fn down(&self, ctx: &C) -> std::result::Result<(), BoxError>;
}

/// A named migration
pub struct Migration<C> {
    name: String,
    path: Option<PathBuf>,
    step: Arc<dyn MigrationStep<C>>,
}

impl<C> Migration<C> {
    /// Define a migration from its procedures
    pub fn new(name: impl Into<String>, step: impl MigrationStep<C> + 'static) -> Self {
        Self {
            name: name.into(),
            path: None,
            step: Arc::new(step),
        }
    }

    /// Record the file this migration came from
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Migration name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Metadata reported to callers
    pub fn meta(&self) -> MigrationMeta {
        MigrationMeta {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }

    pub(crate) async fn run_up(&self, ctx: &C) -> Result<()> {
        self.step.up(ctx).await.map_err(|source| FerryError::Migration {
            name: self.name.clone(),
            direction: "up",
            source,
        })
    }

    pub(crate) async fn run_down(&self, ctx: &C) -> Result<()> {
        self.step.down(ctx).await.map_err(|source| FerryError::Migration {
            name: self.name.clone(),
            direction: "down",
            source,
        })
    }
}

impl<C> Clone for Migration<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            step: Arc::clone(&self.step),
        }
    }
}

impl<C> fmt::Debug for Migration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

/// Migration read from a script file.
///
/// A file holds an optional `-- up` section and an optional `-- down`
/// section. Text before any marker belongs to `up`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMigration {
    name: String,
    up: String,
    down: String,
}

impl ScriptMigration {
    /// Split script text into its sections
    pub fn parse(name: impl Into<String>, source: &str) -> Self {
        let mut up = String::new();
        let mut down = String::new();
        let mut in_down = false;

        for line in source.lines() {
            let marker = line.trim().to_ascii_lowercase();
            if marker == "-- up" {
                in_down = false;
                continue;
            }
            if marker == "-- down" {
                in_down = true;
                continue;
            }
            let target = if in_down { &mut down } else { &mut up };
            target.push_str(line);
            target.push('\n');
        }

        Self {
            name: name.into(),
            up: up.trim().to_string(),
            down: down.trim().to_string(),
        }
    }

    /// Read and parse a script file; the name is the file stem
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| FerryError::Script {
                path: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(name, &source))
    }

    /// Forward script
    pub fn up_script(&self) -> &str {
        &self.up
    }

    /// Backward script
    pub fn down_script(&self) -> &str {
        &self.down
    }
}

#[async_trait]
impl<C: MigrationContext> MigrationStep<C> for ScriptMigration {
    async fn up(&self, ctx: &C) -> std::result::Result<(), BoxError> {
        if self.up.is_empty() {
            return Ok(());
        }
        ctx.run_script(&self.name, &self.up).await
    }

    async fn down(&self, ctx: &C) -> std::result::Result<(), BoxError> {
        if self.down.is_empty() {
            return Ok(());
        }
        ctx.run_script(&self.name, &self.down).await
    }
}
