//! Complete engine configuration

use crate::logger::{ConsoleLogger, MigrationLogger};
use crate::source::MigrationSource;
use crate::storage::Storage;
use std::fmt;
use std::sync::Arc;

/// Everything a [`Migrator`](crate::Migrator) needs. Immutable once built.
pub struct EngineConfig<C> {
    /// Caller-defined handle passed to every migration
    pub context: Arc<C>,
    /// Executed-migrations log
    pub storage: Arc<dyn Storage>,
    /// Where definitions come from
    pub migrations: MigrationSource<C>,
    /// Event sink
    pub logger: Arc<dyn MigrationLogger>,
}

impl<C> EngineConfig<C> {
    /// Configuration with the default source and logger
    pub fn new(context: Arc<C>, storage: Arc<dyn Storage>) -> Self {
        Self {
            context,
            storage,
            migrations: MigrationSource::default(),
            logger: Arc::new(ConsoleLogger),
        }
    }

    /// Replace the migration source
    pub fn with_migrations(mut self, migrations: impl Into<MigrationSource<C>>) -> Self {
        self.migrations = migrations.into();
        self
    }

    /// Replace the logger
    pub fn with_logger(mut self, logger: Arc<dyn MigrationLogger>) -> Self {
        self.logger = logger;
        self
    }
}

impl<C> fmt::Debug for EngineConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("migrations", &self.migrations)
            .finish_non_exhaustive()
    }
}
