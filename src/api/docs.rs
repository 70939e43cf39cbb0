//! API Documentation - Swagger UI
//!
//! Provides OpenAPI documentation at /docs

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{
    environments::{EnvironmentInfo, EnvironmentsResponse},
    models::{ModelInfo, ModelsResponse},
    probes::ProbesResponse,
    scans::{ErrorResponse, ScanSessionView, StartScanRequest, StartScanResponse},
    status::{CreateStatusCheckRequest, StatusCheckView},
};

/// Scanforge API OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scanforge API",
        version = "0.1.0",
        description = "LLM vulnerability scan orchestration service.

## Overview
Scanforge launches garak scans against locally served models and streams
their output in real time:
- **Scans**: Start a scan and poll its session record
- **Catalog**: List installed models, conda environments, and known probes
- **Status**: Record and list client status checks

Live output is delivered over the WebSocket endpoint
`/ws/terminal/{session_id}`, which is outside the OpenAPI surface.
",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Scans
        crate::api::scans::start_scan,
        crate::api::scans::get_scan_status,
        // Catalog
        crate::api::models::list_models,
        crate::api::environments::list_environments,
        crate::api::probes::list_probes,
        // Status checks
        crate::api::status::create_status_check,
        crate::api::status::list_status_checks,
    ),
    components(
        schemas(
            // Scans
            StartScanRequest,
            StartScanResponse,
            ScanSessionView,
            ErrorResponse,
            // Catalog
            ModelsResponse,
            ModelInfo,
            EnvironmentsResponse,
            EnvironmentInfo,
            ProbesResponse,
            // Status checks
            CreateStatusCheckRequest,
            StatusCheckView,
        )
    ),
    tags(
        (name = "scans", description = "Scan orchestration"),
        (name = "catalog", description = "Models, environments, and probes"),
        (name = "status", description = "Client status checks"),
    )
)]
pub struct ApiDoc;

/// Create documentation routes
pub fn docs_routes() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
}
