//! Storage backends recording which migrations have executed

use crate::error::{FerryError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::trace;

/// File used by [`JsonStorage`] when no path is given
pub const DEFAULT_JSON_STORAGE_PATH: &str = "ferry.json";

/// Persistence for the executed-migrations log.
///
/// Relational and document-store backends live with the caller; they
/// only need to keep an ordered list of names.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Names of executed migrations, oldest first
    async fn executed(&self) -> Result<Vec<String>>;

    /// Record a migration as executed
    async fn log_migration(&self, name: &str) -> Result<()>;

    /// Forget an executed migration
    async fn unlog_migration(&self, name: &str) -> Result<()>;
}

/// Process-local storage, lost on restart
#[derive(Debug, Default)]
pub struct MemoryStorage {
    executed: Mutex<Vec<String>>,
}

impl MemoryStorage {
    /// Empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with executed names
    pub fn with_executed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executed: Mutex::new(names.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn executed(&self) -> Result<Vec<String>> {
        Ok(self.executed.lock().clone())
    }

    async fn log_migration(&self, name: &str) -> Result<()> {
        self.executed.lock().push(name.to_string());
        Ok(())
    }

    async fn unlog_migration(&self, name: &str) -> Result<()> {
        self.executed.lock().retain(|n| n != name);
        Ok(())
    }
}

/// Storage backed by a JSON array of names on disk
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    /// Storage writing to `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, names: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_vec_pretty(names)?;
        tokio::fs::write(&self.path, body).await?;
        trace!("Wrote {} names to {}", names.len(), self.path.display());
        Ok(())
    }
}

impl Default for JsonStorage {
    fn default() -> Self {
        Self::new(DEFAULT_JSON_STORAGE_PATH)
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn executed(&self) -> Result<Vec<String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                FerryError::Storage(format!("{} is not a JSON name list: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn log_migration(&self, name: &str) -> Result<()> {
        let mut names = self.executed().await?;
        names.push(name.to_string());
        self.write(&names).await
    }

    async fn unlog_migration(&self, name: &str) -> Result<()> {
        let mut names = self.executed().await?;
        names.retain(|n| n != name);
        self.write(&names).await
    }
}
