//! Integration tests for the Ferry HTTP endpoints

use async_trait::async_trait;
use axum::{routing::get, Router};
use ferry_core::{BoxError, Migration, MigrationContext, MigrationMeta, MigrationStep, SilentLogger};
use ferry_server::{
    api::*, mount, ConfigError, EngineOptions, JsonStorage, MemoryStorage, MountOptions,
    SecretComparison, Settings,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::sync::Arc;

const SECRET: &str = "randomsecretkey";

/// Context recording which procedures ran
#[derive(Default)]
struct Journal {
    calls: Mutex<Vec<String>>,
}

impl MigrationContext for Journal {}

struct Recorded(String);

#[async_trait]
impl MigrationStep<Journal> for Recorded {
    async fn up(&self, ctx: &Journal) -> Result<(), BoxError> {
        ctx.calls.lock().push(format!("up:{}", self.0));
        Ok(())
    }

    async fn down(&self, ctx: &Journal) -> Result<(), BoxError> {
        ctx.calls.lock().push(format!("down:{}", self.0));
        Ok(())
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    journal: Arc<Journal>,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("x-secret-key", SECRET)
            .send()
            .await
            .expect("Failed to send request")
    }

    async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("x-secret-key", SECRET)
            .send()
            .await
            .expect("Failed to send request")
    }

    async fn post_without_secret(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send request")
    }
}

fn options(names: &[&str], base_path: Option<&str>) -> (MountOptions<Journal>, Arc<Journal>) {
    let journal = Arc::new(Journal::default());
    let migrations: Vec<Migration<Journal>> = names
        .iter()
        .map(|name| Migration::new(*name, Recorded(name.to_string())))
        .collect();
    let mut options = MountOptions::new(SECRET).engine(
        EngineOptions::new()
            .context(journal.clone())
            .storage(Arc::new(MemoryStorage::new()))
            .migrations(migrations)
            .logger(Arc::new(SilentLogger)),
    );
    if let Some(base) = base_path {
        options = options.base_path(base);
    }
    (options, journal)
}

/// Serve `router` on an ephemeral port
async fn serve(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to port");
    let addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), handle)
}

async fn setup_test_server(names: &[&str], base_path: Option<&str>) -> TestServer {
    let (options, journal) = options(names, base_path);
    let router = mount(options).expect("Failed to mount migration routes");
    let (base_url, handle) = serve(router).await;

    TestServer {
        base_url,
        client: reqwest::Client::new(),
        journal,
        _handle: handle,
    }
}

fn names(metas: &[MigrationMeta]) -> Vec<&str> {
    metas.iter().map(|m| m.name.as_str()).collect()
}

#[tokio::test]
async fn test_up_runs_everything_in_order() {
    let server = setup_test_server(&["m1", "m2", "m3"], None).await;

    let response = server.post("/migrations/up").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MigrationsResponse = response.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m1", "m2", "m3"]);

    let body: PendingResponse = server.get("/migrations/pending").await.json().await.unwrap();
    assert!(body.pending.is_empty());

    let body: MigrationsResponse = server.post("/migrations/up").await.json().await.unwrap();
    assert!(body.migrations.is_empty());

    assert_eq!(*server.journal.calls.lock(), vec!["up:m1", "up:m2", "up:m3"]);
}

#[tokio::test]
async fn test_down_step_then_executed() {
    let server = setup_test_server(&["m1", "m2", "m3"], None).await;
    server.post("/migrations/up").await;

    let response = server.post("/migrations/down/step/2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MigrationsResponse = response.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m3", "m2"]);

    let body: ExecutedResponse = server.get("/migrations/executed").await.json().await.unwrap();
    assert_eq!(names(&body.executed), vec!["m1"]);

    let body: MigrationsResponse = server.post("/migrations/down/step/1").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m1"]);

    let body: ExecutedResponse = server.get("/migrations/executed").await.json().await.unwrap();
    assert!(body.executed.is_empty());
}

#[tokio::test]
async fn test_all_lists_executed_before_pending() {
    let server = setup_test_server(&["m1", "m2", "m3"], None).await;
    server.post("/migrations/up/step/1").await;

    let response = server.get("/migrations/all").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: AllResponse = response.json().await.unwrap();
    assert_eq!(names(&body.all), vec!["m1", "m2", "m3"]);

    let executed: ExecutedResponse = server.get("/migrations/executed").await.json().await.unwrap();
    let pending: PendingResponse = server.get("/migrations/pending").await.json().await.unwrap();
    let mut joined = executed.executed;
    joined.extend(pending.pending);
    assert_eq!(body.all, joined);
}

#[tokio::test]
async fn test_up_by_id() {
    let server = setup_test_server(&["m1", "m2", "m3"], None).await;

    let body: MigrationsResponse = server.post("/migrations/up/m1").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m1"]);

    let body: MigrationsResponse = server.post("/migrations/up/m3").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m2", "m3"]);

    let response = server.post("/migrations/up/m1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Couldn't find migration to apply with name \"m1\"");
}

#[tokio::test]
async fn test_down_by_id() {
    let server = setup_test_server(&["m1", "m2", "m3"], None).await;
    server.post("/migrations/up").await;

    let body: MigrationsResponse = server.post("/migrations/down/m2").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m3", "m2"]);

    let response = server.post("/migrations/down/m3").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Couldn't find migration to apply with name \"m3\"");
}

#[tokio::test]
async fn test_down_reverts_only_the_last() {
    let server = setup_test_server(&["m1", "m2"], None).await;
    server.post("/migrations/up").await;

    let body: MigrationsResponse = server.post("/migrations/down").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m2"]);

    let body: MigrationsResponse = server.post("/migrations/down").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m1"]);

    let body: MigrationsResponse = server.post("/migrations/down").await.json().await.unwrap();
    assert!(body.migrations.is_empty());
}

#[tokio::test]
async fn test_bad_count_reaches_engine() {
    let server = setup_test_server(&["m1"], None).await;

    let response = server.post("/migrations/up/step/two").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(
        body.message,
        "Invalid step count \"two\": expected a non-negative integer"
    );

    for path in [
        "/migrations/down/step/",
        "/migrations/up/step",
        "/migrations/down/step",
    ] {
        let response = server.post(path).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", path);
        let body: ErrorResponse = response.json().await.unwrap();
        assert_eq!(
            body.message,
            "Invalid step count \"\": expected a non-negative integer"
        );
    }

    let response = server.post_without_secret("/migrations/up/step").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(server.journal.calls.lock().is_empty());
}

#[tokio::test]
async fn test_undecodable_id_checks_secret_first() {
    let server = setup_test_server(&["m1"], None).await;

    let response = server.post_without_secret("/migrations/up/%FF").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Invalid secret key");

    let response = server.post("/migrations/down/%FF").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(body.message.starts_with("Invalid URL"));
}

#[tokio::test]
async fn test_trailing_slash_routes() {
    let server = setup_test_server(&["m1", "m2"], None).await;

    let body: MigrationsResponse = server.post("/migrations/up/step/1/").await.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m1"]);

    let body: ExecutedResponse = server.get("/migrations/executed/").await.json().await.unwrap();
    assert_eq!(names(&body.executed), vec!["m1"]);
}

#[tokio::test]
async fn test_missing_secret_never_touches_engine() {
    let server = setup_test_server(&["m1", "m2"], None).await;

    for path in [
        "/migrations/up",
        "/migrations/down",
        "/migrations/up/m1",
        "/migrations/down/m1",
        "/migrations/up/step/1",
        "/migrations/down/step/1",
    ] {
        let response = server.post_without_secret(path).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: ErrorResponse = response.json().await.unwrap();
        assert_eq!(body.message, "Invalid secret key");
    }

    let response = server
        .client
        .get(format!("{}/migrations/pending", server.base_url))
        .header("x-secret-key", "not-the-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(server.journal.calls.lock().is_empty());
    let body: PendingResponse = server.get("/migrations/pending").await.json().await.unwrap();
    assert_eq!(body.pending.len(), 2);
}

#[tokio::test]
async fn test_base_path() {
    let server = setup_test_server(&["m1", "m2", "m3"], Some("/my-app")).await;

    let response = server.post("/my-app/migrations/up/step/2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MigrationsResponse = response.json().await.unwrap();
    assert_eq!(names(&body.migrations), vec!["m1", "m2"]);

    assert_eq!(server.get("/migrations/pending").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.post("/migrations/up").await.status(), StatusCode::NOT_FOUND);

    let response = server.post_without_secret("/my-app/migrations/down").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_nested_in_host_application() {
    let (options, _) = options(&["m1"], Some("/admin"));
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(mount(options).unwrap());
    let (base_url, _handle) = serve(app).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{}/health", base_url)).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "ok");

    let response = client
        .get(format!("{}/admin/migrations/pending", base_url))
        .header("x-secret-key", SECRET)
        .send()
        .await
        .unwrap();
    let body: PendingResponse = response.json().await.unwrap();
    assert_eq!(names(&body.pending), vec!["m1"]);
}

#[tokio::test]
async fn test_constant_time_comparison_behaves_the_same() {
    let (options, _) = options(&["m1"], None);
    let router = mount(options.secret_comparison(SecretComparison::ConstantTime)).unwrap();
    let (base_url, _handle) = serve(router).await;
    let client = reqwest::Client::new();

    let ok = client
        .get(format!("{}/migrations/pending", base_url))
        .header("x-secret-key", SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let rejected = client
        .get(format!("{}/migrations/pending", base_url))
        .header("x-secret-key", "randomsecretke")
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_json_storage_shared_across_mounts() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("ferry.json");

    let build = |path: std::path::PathBuf| {
        let journal = Arc::new(Journal::default());
        MountOptions::new(SECRET).engine(
            EngineOptions::new()
                .context(journal)
                .storage(Arc::new(JsonStorage::new(path)))
                .migrations(vec![
                    Migration::new("m1", Recorded("m1".to_string())),
                    Migration::new("m2", Recorded("m2".to_string())),
                ])
                .logger(Arc::new(SilentLogger)),
        )
    };

    let (first_url, _first) = serve(mount(build(state_file.clone())).unwrap()).await;
    let client = reqwest::Client::new();
    client
        .post(format!("{}/migrations/up/m1", first_url))
        .header("x-secret-key", SECRET)
        .send()
        .await
        .unwrap();

    let (second_url, _second) = serve(mount(build(state_file)).unwrap()).await;
    let body: ExecutedResponse = client
        .get(format!("{}/migrations/executed", second_url))
        .header("x-secret-key", SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&body.executed), vec!["m1"]);
}

#[test]
fn test_mount_configuration_errors() {
    let err = mount::<Journal>(MountOptions::new("")).unwrap_err();
    assert_eq!(err.to_string(), "secretKey is required");

    let no_context: MountOptions<Journal> = MountOptions::new(SECRET)
        .engine(EngineOptions::new().storage(Arc::new(MemoryStorage::new())));
    assert_eq!(mount(no_context).unwrap_err().to_string(), "context is required");

    let no_storage = MountOptions::new(SECRET)
        .engine(EngineOptions::new().context(Arc::new(Journal::default())));
    assert_eq!(mount(no_storage).unwrap_err().to_string(), "storage is required");

    let err = Settings::from_value(serde_json::Value::Null).unwrap_err();
    assert!(matches!(err, ConfigError::NotAnObject));
    assert_eq!(err.to_string(), "options must be an object");
}

#[test]
fn test_mount_from_settings() {
    let settings = Settings::from_toml_str(
        r#"
        secret_key = "randomsecretkey"
        base_path = "my-app"
        "#,
    )
    .unwrap();
    assert!(mount(settings.into_mount_options(Arc::new(Journal::default()))).is_ok());
}
