//! Structured logging of migration runs

use serde::Serialize;
use std::time::Duration;

/// What happened to a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// About to apply
    Migrating,
    /// Applied
    Migrated,
    /// About to revert
    Reverting,
    /// Reverted
    Reverted,
}

/// One structured log record emitted by the migrator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationEvent {
    /// Event kind
    pub event: EventKind,
    /// Migration name
    pub name: String,
    /// Time taken, on completion events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl MigrationEvent {
    /// Event without timing
    pub fn new(event: EventKind, name: &str) -> Self {
        Self {
            event,
            name: name.to_string(),
            duration_seconds: None,
        }
    }

    /// Completion event with timing
    pub fn finished(event: EventKind, name: &str, elapsed: Duration) -> Self {
        Self {
            event,
            name: name.to_string(),
            duration_seconds: Some(elapsed.as_secs_f64()),
        }
    }
}

/// Sink for migration events at four levels
pub trait MigrationLogger: Send + Sync {
    /// Informational event
    fn info(&self, event: &MigrationEvent);
    /// Warning
    fn warn(&self, event: &MigrationEvent);
    /// Error
    fn error(&self, event: &MigrationEvent);
    /// Debug detail
    fn debug(&self, event: &MigrationEvent);
}

/// Default logger, forwarding to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

impl MigrationLogger for ConsoleLogger {
    fn info(&self, e: &MigrationEvent) {
        tracing::info!(event = ?e.event, name = %e.name, duration_seconds = ?e.duration_seconds, "migration event");
    }

    fn warn(&self, e: &MigrationEvent) {
        tracing::warn!(event = ?e.event, name = %e.name, duration_seconds = ?e.duration_seconds, "migration event");
    }

    fn error(&self, e: &MigrationEvent) {
        tracing::error!(event = ?e.event, name = %e.name, duration_seconds = ?e.duration_seconds, "migration event");
    }

    fn debug(&self, e: &MigrationEvent) {
        tracing::debug!(event = ?e.event, name = %e.name, duration_seconds = ?e.duration_seconds, "migration event");
    }
}

/// Logger that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentLogger;

impl MigrationLogger for SilentLogger {
    fn info(&self, _: &MigrationEvent) {}
    fn warn(&self, _: &MigrationEvent) {}
    fn error(&self, _: &MigrationEvent) {}
    fn debug(&self, _: &MigrationEvent) {}
}
