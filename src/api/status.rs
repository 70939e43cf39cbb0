//! Status check endpoints
//!
//! POST /api/status - Record a client status check
//! GET /api/status - List recorded status checks

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use scanforge_core::{StatusCheck, StatusCheckStore};

use super::scans::error_response;

/// Create the status check routes
pub fn status_routes() -> Router {
    Router::new().route(
        "/api/status",
        post(create_status_check).get(list_status_checks),
    )
}

/// Request body for recording a status check
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStatusCheckRequest {
    pub client_name: String,
}

/// One recorded status check
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCheckView {
    pub id: Uuid,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl From<StatusCheck> for StatusCheckView {
    fn from(check: StatusCheck) -> Self {
        Self {
            id: check.id,
            client_name: check.client_name,
            timestamp: check.timestamp,
        }
    }
}

/// Record a status check
#[utoipa::path(
    post,
    path = "/api/status",
    tag = "status",
    request_body = CreateStatusCheckRequest,
    responses(
        (status = 200, description = "Created record", body = StatusCheckView)
    )
)]
pub async fn create_status_check(
    Extension(store): Extension<Arc<StatusCheckStore>>,
    Json(request): Json<CreateStatusCheckRequest>,
) -> Response {
    let check = StatusCheck::new(request.client_name);
    match store.create(&check).await {
        Ok(()) => Json(StatusCheckView::from(check)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// List recorded status checks
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "status",
    responses(
        (status = 200, description = "Recorded checks, oldest first", body = [StatusCheckView])
    )
)]
pub async fn list_status_checks(
    Extension(store): Extension<Arc<StatusCheckStore>>,
) -> Response {
    match store.list(1000).await {
        Ok(checks) => Json(
            checks
                .into_iter()
                .map(StatusCheckView::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => error_response(&e),
    }
}
