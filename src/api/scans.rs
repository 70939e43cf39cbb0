//! Scan API endpoints
//!
//! POST /api/scan/start - Launch a vulnerability scan
//! GET /api/scan/:session_id - Get scan status and output

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use scanforge_core::{Error as CoreError, ScanOrchestrator, ScanRequest, ScanSession};

/// Create the scan routes
pub fn scans_routes() -> Router {
    Router::new()
        .route("/api/scan/start", post(start_scan))
        .route("/api/scan/:session_id", get(get_scan_status))
}

/// Request body for starting a scan
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartScanRequest {
    /// Model to scan (as known to Ollama)
    pub model_name: String,
    /// Conda environment the tool runs in
    pub environment: String,
    /// Scan tool identifier
    pub tool: String,
    /// Probe to run
    pub probe: String,
}

/// Response for a successfully launched scan
#[derive(Debug, Serialize, ToSchema)]
pub struct StartScanResponse {
    pub session_id: Uuid,
    pub status: String,
}

/// Full session record returned by the status endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanSessionView {
    pub id: Uuid,
    pub model_name: String,
    pub environment: String,
    pub tool: String,
    pub probe: String,
    pub status: String,
    pub output: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ScanSession> for ScanSessionView {
    fn from(session: ScanSession) -> Self {
        Self {
            id: session.id,
            model_name: session.model_name,
            environment: session.environment,
            tool: session.tool,
            probe: session.probe,
            status: session.status.to_string(),
            output: session.output,
            created_at: session.created_at,
            completed_at: session.completed_at,
        }
    }
}

/// Error body shared by the scan and status-check endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map a core error onto an HTTP response
pub(crate) fn error_response(err: &CoreError) -> Response {
    let status = match err {
        CoreError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ if err.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
        .into_response()
}

/// Start a vulnerability scan
#[utoipa::path(
    post,
    path = "/api/scan/start",
    tag = "scans",
    request_body = StartScanRequest,
    responses(
        (status = 200, description = "Scan launched", body = StartScanResponse),
        (status = 400, description = "Empty field or unsupported tool", body = ErrorResponse)
    )
)]
pub async fn start_scan(
    Extension(orchestrator): Extension<Arc<ScanOrchestrator>>,
    Json(request): Json<StartScanRequest>,
) -> Response {
    let request = ScanRequest {
        model_name: request.model_name,
        environment: request.environment,
        tool: request.tool,
        probe: request.probe,
    };

    match orchestrator.start(request).await {
        Ok(session_id) => Json(StartScanResponse {
            session_id,
            status: "started".to_string(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Get scan status and output
#[utoipa::path(
    get,
    path = "/api/scan/{session_id}",
    tag = "scans",
    params(("session_id" = Uuid, Path, description = "Session id returned by start")),
    responses(
        (status = 200, description = "Full session record", body = ScanSessionView),
        (status = 404, description = "Unknown session id", body = ErrorResponse)
    )
)]
pub async fn get_scan_status(
    Extension(orchestrator): Extension<Arc<ScanOrchestrator>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match orchestrator.status(session_id).await {
        Ok(session) => Json(ScanSessionView::from(session)).into_response(),
        Err(e) => error_response(&e),
    }
}
