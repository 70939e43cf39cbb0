//! Scanforge Core - Scan Orchestration and Streaming
//!
//! This crate provides the scan orchestration core for scanforge:
//! - Session: scan session types and lifecycle states
//! - Store: persistent session records keyed by session id
//! - Registry: per-session observer sets with broadcast fan-out
//! - Runner: external-process supervision with incremental output capture
//! - Orchestrator: session creation, detached launch, and status lookup
//! - Events: the typed event stream pushed to observers
//! - Error: error types for scan operations
//!
//! ## Usage
//!
//! ```ignore
//! use scanforge_core::{
//!     ObserverRegistry, ScanOrchestrator, ScanRequest, SessionStore,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(SessionStore::new(pool));
//! store.init().await?;
//! let registry = Arc::new(ObserverRegistry::new());
//! let orchestrator = ScanOrchestrator::new(store, registry.clone());
//!
//! let session_id = orchestrator
//!     .start(ScanRequest {
//!         model_name: "llama3".into(),
//!         environment: "garak-env".into(),
//!         tool: "garak".into(),
//!         probe: "test.Test".into(),
//!     })
//!     .await?;
//! ```
//!
//! Each started scan runs as an independent detached task; events reach the
//! session's observers in emission order, and failures inside one scan never
//! affect another.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod registry;
pub mod runner;
pub mod session;
pub mod status;
pub mod store;

// Re-export main types
pub use error::{Error, Result};
pub use events::ScanEvent;
pub use orchestrator::ScanOrchestrator;
pub use registry::{ObserverHandle, ObserverRegistry};
pub use runner::{is_progress_line, ScanRunner};
pub use session::{ScanRequest, ScanSession, ScanStatus};
pub use status::{StatusCheck, StatusCheckStore};
pub use store::{SessionPatch, SessionStore};
