//! Scan session types
//!
//! A session tracks one invocation of an external scan tool from request to
//! terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Lifecycle status of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Created, runner not yet started
    Pending,
    /// Runner active; the external process may or may not exist yet
    Running,
    /// Process exited with code zero
    Completed,
    /// Process exited non-zero or the scan faulted
    Failed,
}

impl ScanStatus {
    /// Stable string form, matching the serde representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the session has finished, successfully or not
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(Error::Database(format!("invalid scan status: {other}"))),
        }
    }
}

/// Parameters for starting a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Model the scan targets (as known to the serving backend)
    pub model_name: String,
    /// Conda environment the tool runs in
    pub environment: String,
    /// Scan tool identifier
    pub tool: String,
    /// Probe the tool should run
    pub probe: String,
}

impl ScanRequest {
    /// Check that every target field is present.
    ///
    /// Values are otherwise opaque; deeper validation is the runner's job.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("model_name", &self.model_name),
            ("environment", &self.environment),
            ("tool", &self.tool),
            ("probe", &self.probe),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

/// One tracked invocation of an external scan tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    /// Unique session identifier, generated at creation
    pub id: Uuid,
    /// Target model
    pub model_name: String,
    /// Conda environment
    pub environment: String,
    /// Scan tool
    pub tool: String,
    /// Probe to run
    pub probe: String,
    /// Current lifecycle status
    pub status: ScanStatus,
    /// Combined process output, written once at finalization
    #[serde(default)]
    pub output: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Set exactly when the session reaches a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    /// Create a new pending session from a request
    #[must_use]
    pub fn new(request: ScanRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_name: request.model_name,
            environment: request.environment,
            tool: request.tool,
            probe: request.probe,
            status: ScanStatus::Pending,
            output: String::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
