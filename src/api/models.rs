//! Model catalog endpoints
//!
//! GET /api/models - List models served by the local Ollama install

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

/// Create the model catalog routes
pub fn models_routes() -> Router {
    Router::new().route("/api/models", get(list_models))
}

/// One installed model as reported by `ollama list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ModelInfo {
    pub name: String,
    pub tag: String,
    pub size: String,
    pub modified: String,
}

/// Model listing; degrades to an empty list when Ollama is unavailable
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// List available Ollama models
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "catalog",
    responses(
        (status = 200, description = "Installed models, or an empty list with an error note", body = ModelsResponse)
    )
)]
pub async fn list_models() -> Json<ModelsResponse> {
    match tokio::process::Command::new("ollama")
        .arg("list")
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Json(ModelsResponse {
                models: parse_ollama_list(&stdout),
                error: None,
            })
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(error = %stderr.trim(), "ollama list failed");
            Json(ModelsResponse {
                models: Vec::new(),
                error: Some("Ollama not available".to_string()),
            })
        }
        Err(e) => {
            warn!(error = %e, "failed to run ollama");
            Json(ModelsResponse {
                models: Vec::new(),
                error: Some(e.to_string()),
            })
        }
    }
}

/// Parse the table printed by `ollama list`, skipping the header row.
fn parse_ollama_list(stdout: &str) -> Vec<ModelInfo> {
    stdout
        .trim()
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            Some(ModelInfo {
                name: parts[0].to_string(),
                tag: parts[1].to_string(),
                size: parts[2].to_string(),
                modified: if parts.len() > 3 {
                    parts[3..].join(" ")
                } else {
                    "unknown".to_string()
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
NAME                    ID              SIZE    MODIFIED
llama3:latest           365c0bd3c000    4.7 GB  2 weeks ago
mistral:7b              61e88e884507    4.1 GB  5 days ago
";

    #[test]
    fn test_parse_ollama_list() {
        let models = parse_ollama_list(SAMPLE);
        assert_eq!(models.len(), 2);
        assert_eq!(
            models[0],
            ModelInfo {
                name: "llama3:latest".to_string(),
                tag: "365c0bd3c000".to_string(),
                size: "4.7".to_string(),
                modified: "GB 2 weeks ago".to_string(),
            }
        );
        assert_eq!(models[1].name, "mistral:7b");
    }

    #[test]
    fn test_parse_ollama_list_empty() {
        assert!(parse_ollama_list("").is_empty());
        assert!(parse_ollama_list("NAME ID SIZE MODIFIED\n").is_empty());
    }

    #[test]
    fn test_parse_ollama_list_skips_short_lines() {
        let models = parse_ollama_list("NAME ID SIZE\nonly-two fields\n");
        assert!(models.is_empty());
    }

    #[test]
    fn test_models_response_hides_absent_error() {
        let json = serde_json::to_string(&ModelsResponse {
            models: Vec::new(),
            error: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"models":[]}"#);
    }
}
