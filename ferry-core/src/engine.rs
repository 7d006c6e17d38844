//! Engine seam used by the HTTP layer

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A migration as reported by an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationMeta {
    /// Unique migration name
    pub name: String,
    /// Source file, when the migration was discovered on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl MigrationMeta {
    /// Metadata for a migration defined in code
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

/// Narrows which migrations a run affects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Forward: every pending migration. Backward: the last executed one.
    #[default]
    All,
    /// Up to and including the named migration
    To(String),
    /// A number of migrations, kept as the caller supplied it
    Step(String),
}

impl Selector {
    /// Selector targeting a migration name
    pub fn to(name: impl Into<String>) -> Self {
        Selector::To(name.into())
    }

    /// Selector for a step count
    pub fn step(count: impl ToString) -> Self {
        Selector::Step(count.to_string())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "all"),
            Selector::To(name) => write!(f, "to={}", name),
            Selector::Step(count) => write!(f, "step={}", count),
        }
    }
}

/// The four operations the HTTP layer needs from a migration engine
#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Migrations not yet executed, in execution order
    async fn pending(&self) -> Result<Vec<MigrationMeta>>;

    /// Migrations already executed, oldest first
    async fn executed(&self) -> Result<Vec<MigrationMeta>>;

    /// Run migrations forward; returns what was applied, in order
    async fn up(&self, selector: Selector) -> Result<Vec<MigrationMeta>>;

    /// Run migrations backward; returns what was reverted, most recent first
    async fn down(&self, selector: Selector) -> Result<Vec<MigrationMeta>>;
}
