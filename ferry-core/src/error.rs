//! Error types for Ferry

use thiserror::Error;

/// Boxed error returned by migration steps and contexts
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum FerryError {
    /// A `to` selector named a migration that is not eligible for the run
    #[error("Couldn't find migration to apply with name \"{0}\"")]
    MigrationNotFound(String),

    /// Storage lists a migration that no longer has a definition
    #[error("Couldn't find migration with name \"{0}\"")]
    UnknownExecuted(String),

    /// Step selector text is not a non-negative integer
    #[error("Invalid step count \"{0}\": expected a non-negative integer")]
    InvalidStep(String),

    /// A migration's up or down procedure failed
    #[error("Migration {name} ({direction}) failed: {source}")]
    Migration {
        /// Migration name
        name: String,
        /// "up" or "down"
        direction: &'static str,
        /// Underlying failure
        #[source]
        source: BoxError,
    },

    /// Script migration file could not be interpreted
    #[error("Script error in {path}: {reason}")]
    Script {
        /// Script location
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Migration discovery pattern could not be compiled
    #[error("Invalid migration pattern \"{pattern}\": {reason}")]
    Pattern {
        /// Pattern text
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, FerryError>;
