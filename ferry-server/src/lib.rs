//! Ferry HTTP Server - control-plane endpoints for a migration engine
//!
//! [`mount`] validates [`MountOptions`], builds a migration engine and
//! returns an axum [`Router`](axum::Router) exposing the migration
//! endpoints under `{base_path}/migrations`. Every endpoint requires the
//! `x-secret-key` header. The router does not bind a port; the host
//! application nests or serves it.

pub mod api;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod options;
pub mod router;
pub mod settings;
pub mod state;
pub mod tracing;

pub use api::{AllResponse, ErrorResponse, ExecutedResponse, MigrationsResponse, PendingResponse};
pub use auth::{authorize, SecretComparison, SecretKey, SECRET_HEADER};
pub use error::{ApiError, ApiResult, ConfigError};
pub use options::{EngineOptions, MountOptions};
pub use router::{mount, mount_engine};
pub use settings::{Settings, StorageSettings};
pub use state::MigrationState;

pub use ferry_core::{JsonStorage, MemoryStorage, Storage};
