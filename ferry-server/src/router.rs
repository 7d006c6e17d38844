//! Route table builder

use crate::auth::SecretKey;
use crate::error::ConfigError;
use crate::handlers;
use crate::options::{normalize, normalize_base_path, MountOptions};
use crate::state::MigrationState;
use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use ferry_core::{MigrationContext, MigrationEngine, Migrator};
use std::sync::Arc;
use tracing::info;

/// Path segment every route lives under
pub const MIGRATIONS_PATH: &str = "migrations";

/// Validate options, build a [`Migrator`], and bind the migration routes.
///
/// Fails before any route exists when the options are incomplete. Each
/// call produces an independent engine and router.
pub fn mount<C: MigrationContext>(options: MountOptions<C>) -> Result<Router, ConfigError> {
    let normalized = normalize(options)?;
    let engine: Arc<dyn MigrationEngine> = Arc::new(Migrator::new(normalized.config));
    Ok(bind(
        MigrationState::new(engine, normalized.secret),
        &normalized.base_path,
    ))
}

/// Bind the migration routes in front of any engine
pub fn mount_engine(
    engine: Arc<dyn MigrationEngine>,
    secret: SecretKey,
    base_path: &str,
) -> Result<Router, ConfigError> {
    if secret.matches("") {
        return Err(ConfigError::SecretKeyRequired);
    }
    Ok(bind(
        MigrationState::new(engine, secret),
        &normalize_base_path(base_path),
    ))
}

fn bind(state: MigrationState, base_path: &str) -> Router {
    let root = format!("{}/{}", base_path, MIGRATIONS_PATH);
    info!("Mounting migration routes under {}", root);

    let routes: [(&str, MethodRouter<MigrationState>); 11] = [
        ("all", get(handlers::list_all)),
        ("pending", get(handlers::list_pending)),
        ("executed", get(handlers::list_executed)),
        ("up", post(handlers::up)),
        ("down", post(handlers::down)),
        ("up/:id", post(handlers::up_to)),
        ("down/:id", post(handlers::down_to)),
        ("up/step/:count", post(handlers::up_step)),
        ("down/step/:count", post(handlers::down_step)),
        // Missing count still reaches the engine, which reports it
        ("up/step", post(handlers::up_step)),
        ("down/step", post(handlers::down_step)),
    ];

    // Every path also answers with a trailing slash
    routes
        .into_iter()
        .fold(Router::new(), |router, (suffix, handler)| {
            let path = format!("{}/{}", root, suffix);
            router
                .route(&format!("{}/", path), handler.clone())
                .route(&path, handler)
        })
        .with_state(state)
}
