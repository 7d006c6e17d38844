//! Reference migration engine

use crate::config::EngineConfig;
use crate::engine::{MigrationEngine, MigrationMeta, Selector};
use crate::error::{FerryError, Result};
use crate::logger::{EventKind, MigrationEvent};
use crate::migration::{Migration, MigrationContext};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

/// Runs migrations from a [`MigrationSource`](crate::MigrationSource)
/// and records them in a [`Storage`](crate::Storage).
///
/// Definitions are resolved again on every call so files added on disk
/// show up without a restart. No run lock is taken; two concurrent
/// mutating calls race unless the storage serializes them.
#[derive(Debug)]
pub struct Migrator<C> {
    config: EngineConfig<C>,
}

impl<C: MigrationContext> Migrator<C> {
    /// Create an engine from a complete configuration
    pub fn new(config: EngineConfig<C>) -> Self {
        Self { config }
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &EngineConfig<C> {
        &self.config
    }

    async fn load(&self) -> Result<(Vec<Migration<C>>, Vec<String>)> {
        let migrations = self.config.migrations.resolve()?;
        let executed = self.config.storage.executed().await?;
        Ok((migrations, executed))
    }

    fn pending_of(migrations: Vec<Migration<C>>, executed: &[String]) -> Vec<Migration<C>> {
        let done: HashSet<&str> = executed.iter().map(String::as_str).collect();
        migrations
            .into_iter()
            .filter(|m| !done.contains(m.name()))
            .collect()
    }

    async fn apply(&self, migration: &Migration<C>) -> Result<MigrationMeta> {
        let logger = &self.config.logger;
        logger.info(&MigrationEvent::new(EventKind::Migrating, migration.name()));
        let start = Instant::now();

        migration.run_up(&self.config.context).await?;
        self.config.storage.log_migration(migration.name()).await?;

        logger.info(&MigrationEvent::finished(
            EventKind::Migrated,
            migration.name(),
            start.elapsed(),
        ));
        Ok(migration.meta())
    }

    async fn revert(&self, migration: &Migration<C>) -> Result<MigrationMeta> {
        let logger = &self.config.logger;
        logger.info(&MigrationEvent::new(EventKind::Reverting, migration.name()));
        let start = Instant::now();

        migration.run_down(&self.config.context).await?;
        self.config.storage.unlog_migration(migration.name()).await?;

        logger.info(&MigrationEvent::finished(
            EventKind::Reverted,
            migration.name(),
            start.elapsed(),
        ));
        Ok(migration.meta())
    }
}

/// Parse step text; it arrives verbatim from the caller
fn parse_step(raw: &str) -> Result<usize> {
    raw.parse::<usize>()
        .map_err(|_| FerryError::InvalidStep(raw.to_string()))
}

/// Prefix of `items` ending at the entry named `name`
fn until_named<T>(items: Vec<T>, name: &str, name_of: impl Fn(&T) -> &str) -> Result<Vec<T>> {
    let idx = items
        .iter()
        .position(|item| name_of(item) == name)
        .ok_or_else(|| FerryError::MigrationNotFound(name.to_string()))?;
    Ok(items.into_iter().take(idx + 1).collect())
}

#[async_trait]
impl<C: MigrationContext> MigrationEngine for Migrator<C> {
    async fn pending(&self) -> Result<Vec<MigrationMeta>> {
        let (migrations, executed) = self.load().await?;
        Ok(Self::pending_of(migrations, &executed)
            .iter()
            .map(Migration::meta)
            .collect())
    }

    async fn executed(&self) -> Result<Vec<MigrationMeta>> {
        let (migrations, executed) = self.load().await?;
        Ok(executed
            .into_iter()
            .map(|name| match migrations.iter().find(|m| m.name() == name) {
                Some(m) => m.meta(),
                None => MigrationMeta::named(name),
            })
            .collect())
    }

    async fn up(&self, selector: Selector) -> Result<Vec<MigrationMeta>> {
        let (migrations, executed) = self.load().await?;
        let pending = Self::pending_of(migrations, &executed);

        let selected = match &selector {
            Selector::All => pending,
            Selector::To(name) => until_named(pending, name, |m| m.name())?,
            Selector::Step(raw) => pending.into_iter().take(parse_step(raw)?).collect(),
        };
        debug!("Applying {} migrations ({})", selected.len(), selector);

        let mut applied = Vec::with_capacity(selected.len());
        for migration in &selected {
            applied.push(self.apply(migration).await?);
        }
        Ok(applied)
    }

    async fn down(&self, selector: Selector) -> Result<Vec<MigrationMeta>> {
        let (migrations, executed) = self.load().await?;
        let newest_first: Vec<String> = executed.into_iter().rev().collect();

        let selected = match &selector {
            Selector::All => newest_first.into_iter().take(1).collect(),
            Selector::To(name) => until_named(newest_first, name, |n| n.as_str())?,
            Selector::Step(raw) => newest_first.into_iter().take(parse_step(raw)?).collect(),
        };
        debug!("Reverting {} migrations ({})", selected.len(), selector);

        let mut reverted = Vec::with_capacity(selected.len());
        for name in &selected {
            let migration = migrations
                .iter()
                .find(|m| m.name() == name.as_str())
                .ok_or_else(|| FerryError::UnknownExecuted(name.clone()))?;
            reverted.push(self.revert(migration).await?);
        }
        Ok(reverted)
    }
}
