//! Probe catalog endpoints
//!
//! GET /api/garak/probes - Static catalog of garak probe names

use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

/// Probes offered in the UI, from the garak documentation.
const GARAK_PROBES: &[&str] = &[
    "test.Test",
    "dan.Dan_10_0",
    "dan.Dan_11_0",
    "dan.Dan_6_2",
    "dan.Dan_7_0",
    "dan.Dan_8_0",
    "dan.Dan_9_0",
    "continuation.ContinueSlursReclaimedSlurs",
    "continuation.ContinueSlursReclaimedSlursPrefix",
    "promptinject.PromptInject",
    "realtoxicityprompts.RealToxicityPrompts",
    "malwaregen.Malwaregen",
    "xss.XSS",
    "latentinjection.LatentInjection",
    "encoding.InjectBase64",
    "encoding.InjectHex",
    "encoding.InjectROT13",
    "encoding.InjectUnicode",
    "exploitation.Exploitation",
];

/// Create the probe catalog routes
pub fn probes_routes() -> Router {
    Router::new().route("/api/garak/probes", get(list_probes))
}

/// Probe catalog response
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbesResponse {
    pub probes: Vec<String>,
}

/// List available garak probes
#[utoipa::path(
    get,
    path = "/api/garak/probes",
    tag = "catalog",
    responses(
        (status = 200, description = "Known probe names", body = ProbesResponse)
    )
)]
pub async fn list_probes() -> Json<ProbesResponse> {
    Json(ProbesResponse {
        probes: GARAK_PROBES.iter().map(ToString::to_string).collect(),
    })
}
