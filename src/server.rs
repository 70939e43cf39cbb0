//! Server assembly
//!
//! Configuration loading, shared component wiring, and the HTTP/WebSocket
//! router.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Extension, Router};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use scanforge_core::{ObserverRegistry, ScanOrchestrator, SessionStore, StatusCheckStore};

/// Embedded default configuration (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Durable store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Load configuration from embedded defaults, files, and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        .add_source(
            Environment::with_prefix("SCANFORGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Build the application router with shared components attached
pub fn app_router(
    orchestrator: Arc<ScanOrchestrator>,
    registry: Arc<ObserverRegistry>,
    status_checks: Arc<StatusCheckStore>,
) -> Router {
    Router::new()
        .merge(crate::api::api_router())
        .merge(crate::websocket::websocket_router())
        .layer(Extension(orchestrator))
        .layer(Extension(registry))
        .layer(Extension(status_checks))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the server
pub async fn run() -> Result<()> {
    let config = load_config()?;
    info!("Starting scanforge v{}", env!("CARGO_PKG_VERSION"));

    let pool = SqlitePoolOptions::new()
        .connect(&config.database.url)
        .await
        .context("Failed to open session database")?;

    let store = Arc::new(SessionStore::new(pool.clone()));
    store
        .init()
        .await
        .context("Failed to initialize session schema")?;
    let status_checks = Arc::new(StatusCheckStore::new(pool));
    status_checks
        .init()
        .await
        .context("Failed to initialize status check schema")?;

    let registry = Arc::new(ObserverRegistry::new());
    let orchestrator = Arc::new(ScanOrchestrator::new(store, registry.clone()));

    let app = app_router(orchestrator, registry, status_checks);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("scanforge shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    #[test]
    fn test_default_config_parses() {
        let config = load_config().unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.database.url.starts_with("sqlite:"));
    }

    async fn test_app() -> Router {
        // A single connection so detached runner tasks see the same
        // in-memory database as the handlers.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let store = Arc::new(SessionStore::new(pool.clone()));
        store.init().await.unwrap();
        let status_checks = Arc::new(StatusCheckStore::new(pool));
        status_checks.init().await.unwrap();

        let registry = Arc::new(ObserverRegistry::new());
        let orchestrator = Arc::new(ScanOrchestrator::new(store, registry.clone()));

        app_router(orchestrator, registry, status_checks)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app().await;
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_api_root_message() {
        let app = test_app().await;
        let response = app.oneshot(get("/api/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Scanforge API");
    }

    #[tokio::test]
    async fn test_probes_endpoint() {
        let app = test_app().await;
        let response = app.oneshot(get("/api/garak/probes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let probes = json["probes"].as_array().unwrap();
        assert!(probes.iter().any(|p| p == "test.Test"));
    }

    #[tokio::test]
    async fn test_start_scan_and_lookup() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/scan/start",
                serde_json::json!({
                    "model_name": "llama3",
                    "environment": "scanforge-test-no-such-env",
                    "tool": "garak",
                    "probe": "test.Test",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "started");
        let session_id = json["session_id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(get(&format!("/api/scan/{session_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["id"], session_id);
        assert_eq!(json["tool"], "garak");
        // The detached runner races this lookup, but a garak scan against a
        // nonexistent environment can never complete successfully.
        let status = json["status"].as_str().unwrap();
        assert!(
            ["pending", "running", "failed"].contains(&status),
            "got {status}"
        );
    }

    #[tokio::test]
    async fn test_start_scan_unsupported_tool() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/api/scan/start",
                serde_json::json!({
                    "model_name": "llama3",
                    "environment": "env",
                    "tool": "nmap",
                    "probe": "test.Test",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["code"], "unsupported_tool");
    }

    #[tokio::test]
    async fn test_start_scan_empty_field() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/api/scan/start",
                serde_json::json!({
                    "model_name": "",
                    "environment": "env",
                    "tool": "garak",
                    "probe": "test.Test",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_get_unknown_scan() {
        let app = test_app().await;

        let response = app
            .oneshot(get(&format!("/api/scan/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_check_round_trip() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/status",
                serde_json::json!({ "client_name": "frontend" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/api/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let checks = json.as_array().unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0]["client_name"], "frontend");
    }
}
