//! Web API module for scanforge
//!
//! Provides REST API endpoints for:
//! - Scan orchestration (start, status lookup)
//! - Model, environment, and probe catalogs
//! - Status checks
//! - Health checks and OpenAPI documentation

pub mod docs;
pub mod environments;
pub mod health;
pub mod models;
pub mod probes;
pub mod scans;
pub mod status;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub use docs::docs_routes;
pub use environments::environments_routes;
pub use health::health_routes;
pub use models::models_routes;
pub use probes::probes_routes;
pub use scans::scans_routes;
pub use status::status_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .route("/api/", get(api_root))
        .merge(health_routes())
        .merge(scans_routes())
        .merge(models_routes())
        .merge(environments_routes())
        .merge(probes_routes())
        .merge(status_routes())
        .merge(docs_routes())
}

async fn api_root() -> Json<Value> {
    Json(json!({ "message": "Scanforge API" }))
}
