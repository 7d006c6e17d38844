//! Ferry Core - migration engine seam and reference engine
//!
//! The HTTP layer in `ferry-server` talks to any [`MigrationEngine`].
//! This crate defines that seam and ships [`Migrator`], an engine that
//! runs ordered migrations and records them in a pluggable [`Storage`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod migration;
pub mod migrator;
pub mod source;
pub mod storage;

pub use config::EngineConfig;
pub use engine::{MigrationEngine, MigrationMeta, Selector};
pub use error::{BoxError, FerryError, Result};
pub use logger::{ConsoleLogger, EventKind, MigrationEvent, MigrationLogger, SilentLogger};
pub use migration::{Migration, MigrationContext, MigrationStep, ScriptMigration};
pub use migrator::Migrator;
pub use source::{GlobSource, MigrationSource, DEFAULT_MIGRATION_GLOB};
pub use storage::{JsonStorage, MemoryStorage, Storage};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }
}
