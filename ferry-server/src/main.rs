//! Ferry demo host
//!
//! Serves the migration router from a settings file. Script migrations
//! are logged rather than executed, which makes this binary useful for
//! exercising the API and checking migration ordering.

use async_trait::async_trait;
use axum::{routing::get, Router};
use ferry_core::{BoxError, MigrationContext};
use ferry_server::{handlers, mount, Settings};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Context that records script bodies in the log
struct DryRunContext;

#[async_trait]
impl MigrationContext for DryRunContext {
    async fn run_script(&self, name: &str, script: &str) -> Result<(), BoxError> {
        info!(migration = name, "Dry-run script:\n{}", script);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let enable_otel = std::env::var("OTEL_ENABLED")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if enable_otel {
        ferry_server::tracing::init_tracing_stack("ferry-server")?;
        info!("OpenTelemetry tracing enabled");
    } else {
        ferry_server::tracing::init_console()?;
        info!("Console logging enabled (set OTEL_ENABLED=true for OpenTelemetry)");
    }

    info!("Starting Ferry server v{}", env!("CARGO_PKG_VERSION"));

    ferry_server::metrics::init_prometheus()?;
    ferry_server::metrics::init_metrics();

    let settings = match std::env::var("FERRY_CONFIG").ok().map(PathBuf::from) {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            Settings::load(&path)?
        }
        None => Settings::default(),
    }
    .with_env_overrides();

    let addr: SocketAddr = settings.bind_address.parse()?;
    let migrations = mount(settings.into_mount_options(Arc::new(DryRunContext)))?;

    let app = Router::new()
        .merge(migrations)
        .route("/metrics", get(handlers::metrics))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Received shutdown signal, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    if enable_otel {
        info!("Flushing OpenTelemetry traces...");
        ferry_server::tracing::shutdown_telemetry();
    }

    info!("Server shutdown complete");
    Ok(())
}
