//! Scan orchestrator
//!
//! Entry point for starting scans and looking up session status. A started
//! scan runs as a detached task; its completion is observed through the
//! store and the observer registry, never through a return value.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::registry::ObserverRegistry;
use crate::runner::ScanRunner;
use crate::session::{ScanRequest, ScanSession, ScanStatus};
use crate::store::{SessionPatch, SessionStore};

/// Creates sessions, launches runners, and serves status lookups
pub struct ScanOrchestrator {
    store: Arc<SessionStore>,
    registry: Arc<ObserverRegistry>,
}

impl ScanOrchestrator {
    /// Create an orchestrator sharing the given store and registry
    #[must_use]
    pub fn new(store: Arc<SessionStore>, registry: Arc<ObserverRegistry>) -> Self {
        Self { store, registry }
    }

    /// Create a session and launch its scan as a detached task.
    ///
    /// Returns the session id as soon as the record is persisted; the caller
    /// observes completion through [`status`](Self::status) or an attached
    /// observer. An unrecognized tool is rejected here, before any task or
    /// process exists; the session record keeps the error text so a later
    /// lookup sees `failed` with the reason.
    pub async fn start(&self, request: ScanRequest) -> Result<Uuid> {
        request.validate()?;

        let session = ScanSession::new(request);
        let session_id = session.id;
        self.store.create(&session).await?;

        if let Err(e) = ScanRunner::build_command(&session) {
            let patch = SessionPatch::new()
                .status(ScanStatus::Failed)
                .output(e.to_string())
                .completed_at(Utc::now());
            if let Err(store_err) = self.store.update(session_id, patch).await {
                warn!(%session_id, error = %store_err, "failed to record rejected scan");
            }
            return Err(e);
        }

        let runner = ScanRunner::new(self.store.clone(), self.registry.clone());
        tokio::spawn(async move { runner.run(session).await });
        info!(%session_id, "scan launched");

        Ok(session_id)
    }

    /// Fetch the full session record, including output once terminal
    pub async fn status(&self, id: Uuid) -> Result<ScanSession> {
        self.store.get(id).await
    }
}
