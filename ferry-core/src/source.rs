//! Where migration definitions come from

use crate::error::{FerryError, Result};
use crate::migration::{Migration, MigrationContext, ScriptMigration};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// Pattern used when the caller does not name a migration source
pub const DEFAULT_MIGRATION_GLOB: &str = "migrations/*.sql";

/// Turns a discovered file into a migration
pub type Resolver<C> = Arc<dyn Fn(&Path) -> Result<Migration<C>> + Send + Sync>;

/// Migration definitions, either listed in code or discovered on disk
pub enum MigrationSource<C> {
    /// Migrations defined in code, in execution order
    List(Vec<Migration<C>>),
    /// Migrations discovered from files matching a pattern
    Glob(GlobSource<C>),
}

impl<C> Default for MigrationSource<C> {
    fn default() -> Self {
        MigrationSource::Glob(GlobSource::new(DEFAULT_MIGRATION_GLOB))
    }
}

impl<C> From<Vec<Migration<C>>> for MigrationSource<C> {
    fn from(migrations: Vec<Migration<C>>) -> Self {
        MigrationSource::List(migrations)
    }
}

impl<C> fmt::Debug for MigrationSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationSource::List(list) => f.debug_tuple("List").field(list).finish(),
            MigrationSource::Glob(glob) => f.debug_tuple("Glob").field(&glob.pattern).finish(),
        }
    }
}

impl<C: MigrationContext> MigrationSource<C> {
    /// Produce the ordered migration list
    pub fn resolve(&self) -> Result<Vec<Migration<C>>> {
        match self {
            MigrationSource::List(list) => Ok(list.clone()),
            MigrationSource::Glob(glob) => glob.resolve(),
        }
    }
}

/// File-pattern migration source.
///
/// The directory part is literal and may end in `/**` to search
/// subdirectories; the file-name part supports `*` and `?`.
pub struct GlobSource<C> {
    pattern: String,
    resolver: Option<Resolver<C>>,
}

impl<C> GlobSource<C> {
    /// Source using the default script resolver
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            resolver: None,
        }
    }

    /// Use a custom resolver instead of script files
    pub fn with_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Path) -> Result<Migration<C>> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// The configured pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl<C: MigrationContext> GlobSource<C> {
    fn resolve(&self) -> Result<Vec<Migration<C>>> {
        let files = matching_files(&self.pattern)?;
        debug!("Pattern {} matched {} files", self.pattern, files.len());

        files
            .iter()
            .map(|path| match &self.resolver {
                Some(resolve) => resolve(path),
                None => {
                    let script = ScriptMigration::from_file(path)?;
                    let name = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string();
                    Ok(Migration::new(name, script).with_path(path.clone()))
                }
            })
            .collect()
    }
}

/// Files matching `pattern`, sorted by path
pub fn matching_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let (dir, file_pattern) = match pattern.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => (".", pattern),
    };
    let (dir, recursive) = match dir.strip_suffix("/**") {
        Some(base) => (base, true),
        None if dir == "**" => (".", true),
        None => (dir, false),
    };
    let dir = if dir.is_empty() { "/" } else { dir };

    let matcher = file_name_regex(file_pattern).map_err(|e| FerryError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let root = Path::new(dir);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
        let entry = entry.map_err(|e| FerryError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| matcher.is_match(name))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn file_name_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}
