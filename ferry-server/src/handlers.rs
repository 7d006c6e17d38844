//! HTTP request handlers
//!
//! Every handler checks the secret first and only then calls the engine.
//! Engine failures become 500 responses carrying the engine's message.

use crate::api::{AllResponse, ExecutedResponse, MigrationsResponse, PendingResponse};
use crate::auth::authorize;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{self, RequestTimer};
use crate::state::MigrationState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::HeaderMap,
    Json,
};
use ferry_core::{FerryError, MigrationEngine, MigrationMeta, Selector};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// Path segment as extracted; inspected only after the secret check
type PathParam = Result<Path<String>, PathRejection>;

/// Authorize, then run one engine call inside a request span
async fn guarded<T, E, F, Fut>(
    state: &MigrationState,
    headers: &HeaderMap,
    operation: &'static str,
    call: F,
) -> ApiResult<T>
where
    F: FnOnce(Arc<dyn MigrationEngine>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<ApiError> + fmt::Display,
{
    if !authorize(headers, &state.secret) {
        warn!(operation, "Rejected request with invalid secret key");
        metrics::record_unauthorized(operation);
        return Err(ApiError::Unauthorized);
    }

    let timer = RequestTimer::start(operation);
    let span = crate::tracing::operation_span(operation);
    match call(Arc::clone(&state.engine)).instrument(span.clone()).await {
        Ok(value) => {
            crate::tracing::record_success(&span);
            timer.finish("ok");
            Ok(value)
        }
        Err(e) => {
            error!(operation, "Migration operation failed: {}", e);
            crate::tracing::record_error(&span, &e.to_string());
            timer.finish("error");
            Err(e.into())
        }
    }
}

async fn run(
    state: &MigrationState,
    headers: &HeaderMap,
    operation: &'static str,
    forward: bool,
    selector: ApiResult<Selector>,
) -> ApiResult<Json<MigrationsResponse>> {
    let migrations = guarded(state, headers, operation, |engine| async move {
        let selector = selector?;
        debug!(operation, %selector, "Dispatching migration run");
        let result = if forward {
            engine.up(selector).await
        } else {
            engine.down(selector).await
        };
        result.map_err(ApiError::from)
    })
    .await?;

    let direction = if forward { "up" } else { "down" };
    metrics::record_migrations(direction, migrations.len());
    info!(
        "{}: {} migrations {}",
        operation,
        migrations.len(),
        if forward { "applied" } else { "reverted" }
    );
    Ok(Json(MigrationsResponse { migrations }))
}

/// Target id from the path; an undecodable segment is an operation error
fn to_from(id: PathParam) -> ApiResult<Selector> {
    id.map(|Path(id)| Selector::To(id))
        .map_err(|rejection| ApiError::Operation(rejection.body_text()))
}

/// Step text straight from the path; a missing segment becomes ""
fn step_from(count: PathParam) -> ApiResult<Selector> {
    match count {
        Ok(Path(count)) => Ok(Selector::Step(count)),
        Err(PathRejection::MissingPathParams(_)) => Ok(Selector::Step(String::new())),
        Err(rejection) => Err(ApiError::Operation(rejection.body_text())),
    }
}

/// `GET /migrations/all`: executed followed by pending
pub async fn list_all(
    State(state): State<MigrationState>,
    headers: HeaderMap,
) -> ApiResult<Json<AllResponse>> {
    let all = guarded(&state, &headers, "all", |engine| async move {
        let pending = engine.pending().await?;
        let executed = engine.executed().await?;
        Ok::<Vec<MigrationMeta>, FerryError>(executed.into_iter().chain(pending).collect())
    })
    .await?;
    Ok(Json(AllResponse { all }))
}

/// `GET /migrations/pending`
pub async fn list_pending(
    State(state): State<MigrationState>,
    headers: HeaderMap,
) -> ApiResult<Json<PendingResponse>> {
    let pending = guarded(&state, &headers, "pending", |engine| async move {
        engine.pending().await
    })
    .await?;
    Ok(Json(PendingResponse { pending }))
}

/// `GET /migrations/executed`
pub async fn list_executed(
    State(state): State<MigrationState>,
    headers: HeaderMap,
) -> ApiResult<Json<ExecutedResponse>> {
    let executed = guarded(&state, &headers, "executed", |engine| async move {
        engine.executed().await
    })
    .await?;
    Ok(Json(ExecutedResponse { executed }))
}

/// `POST /migrations/up`
pub async fn up(
    State(state): State<MigrationState>,
    headers: HeaderMap,
) -> ApiResult<Json<MigrationsResponse>> {
    run(&state, &headers, "up", true, Ok(Selector::All)).await
}

/// `POST /migrations/down`
pub async fn down(
    State(state): State<MigrationState>,
    headers: HeaderMap,
) -> ApiResult<Json<MigrationsResponse>> {
    run(&state, &headers, "down", false, Ok(Selector::All)).await
}

/// `POST /migrations/up/:id`
pub async fn up_to(
    State(state): State<MigrationState>,
    headers: HeaderMap,
    id: PathParam,
) -> ApiResult<Json<MigrationsResponse>> {
    run(&state, &headers, "up_to", true, to_from(id)).await
}

/// `POST /migrations/down/:id`
pub async fn down_to(
    State(state): State<MigrationState>,
    headers: HeaderMap,
    id: PathParam,
) -> ApiResult<Json<MigrationsResponse>> {
    run(&state, &headers, "down_to", false, to_from(id)).await
}

/// `POST /migrations/up/step/:count`, also bound without a count
pub async fn up_step(
    State(state): State<MigrationState>,
    headers: HeaderMap,
    count: PathParam,
) -> ApiResult<Json<MigrationsResponse>> {
    run(&state, &headers, "up_step", true, step_from(count)).await
}

/// `POST /migrations/down/step/:count`, also bound without a count
pub async fn down_step(
    State(state): State<MigrationState>,
    headers: HeaderMap,
    count: PathParam,
) -> ApiResult<Json<MigrationsResponse>> {
    run(&state, &headers, "down_step", false, step_from(count)).await
}

/// Prometheus metrics endpoint
pub async fn metrics() -> String {
    metrics::get_prometheus_metrics()
}
