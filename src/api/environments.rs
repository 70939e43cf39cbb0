//! Environment catalog endpoints
//!
//! GET /api/environments - List conda environments on the host

use std::path::Path;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

/// Create the environment catalog routes
pub fn environments_routes() -> Router {
    Router::new().route("/api/environments", get(list_environments))
}

/// One conda environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EnvironmentInfo {
    pub name: String,
    pub path: String,
}

/// Environment listing; degrades to an empty list when conda is unavailable
#[derive(Debug, Serialize, ToSchema)]
pub struct EnvironmentsResponse {
    pub environments: Vec<EnvironmentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// List available conda environments
#[utoipa::path(
    get,
    path = "/api/environments",
    tag = "catalog",
    responses(
        (status = 200, description = "Known environments, or an empty list with an error note", body = EnvironmentsResponse)
    )
)]
pub async fn list_environments() -> Json<EnvironmentsResponse> {
    match tokio::process::Command::new("conda")
        .args(["env", "list", "--json"])
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            match parse_conda_envs(&stdout) {
                Ok(environments) => Json(EnvironmentsResponse {
                    environments,
                    error: None,
                }),
                Err(e) => {
                    warn!(error = %e, "failed to parse conda env list output");
                    Json(EnvironmentsResponse {
                        environments: Vec::new(),
                        error: Some(e.to_string()),
                    })
                }
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(error = %stderr.trim(), "conda env list failed");
            Json(EnvironmentsResponse {
                environments: Vec::new(),
                error: Some("Conda not available".to_string()),
            })
        }
        Err(e) => {
            warn!(error = %e, "failed to run conda");
            Json(EnvironmentsResponse {
                environments: Vec::new(),
                error: Some(e.to_string()),
            })
        }
    }
}

/// Parse the JSON document printed by `conda env list --json`.
fn parse_conda_envs(json: &str) -> serde_json::Result<Vec<EnvironmentInfo>> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    Ok(value
        .get("envs")
        .and_then(|envs| envs.as_array())
        .map(|envs| {
            envs.iter()
                .filter_map(|env| env.as_str())
                .map(|path| EnvironmentInfo {
                    name: Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.to_string()),
                    path: path.to_string(),
                })
                .collect()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conda_envs() {
        let json = r#"{"envs": ["/opt/conda", "/opt/conda/envs/garak-env"]}"#;
        let envs = parse_conda_envs(json).unwrap();
        assert_eq!(envs.len(), 2);
        assert_eq!(
            envs[1],
            EnvironmentInfo {
                name: "garak-env".to_string(),
                path: "/opt/conda/envs/garak-env".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_conda_envs_missing_key() {
        let envs = parse_conda_envs(r#"{"channels": []}"#).unwrap();
        assert!(envs.is_empty());
    }

    #[test]
    fn test_parse_conda_envs_invalid_json() {
        assert!(parse_conda_envs("not json").is_err());
    }
}
