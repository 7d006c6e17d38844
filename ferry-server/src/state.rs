//! Handler dependencies

use crate::auth::SecretKey;
use ferry_core::MigrationEngine;
use std::sync::Arc;

/// Everything the operation handlers close over.
///
/// Built once per mount and cloned into each request; nothing in it
/// changes after the router is returned.
#[derive(Clone)]
pub struct MigrationState {
    /// The engine every handler dispatches to
    pub engine: Arc<dyn MigrationEngine>,

    /// Secret checked by the authorization gate
    pub secret: SecretKey,
}

impl MigrationState {
    /// Create handler state
    pub fn new(engine: Arc<dyn MigrationEngine>, secret: SecretKey) -> Self {
        Self { engine, secret }
    }
}

impl std::fmt::Debug for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationState")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}
