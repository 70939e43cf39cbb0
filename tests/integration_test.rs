//! Integration tests for scanforge
//!
//! These tests verify the scan pipeline across component boundaries:
//! - scanforge-core: orchestrator, store, registry, and runner working
//!   together on a shared in-memory database
//!
//! The scans launched here target a conda environment that does not exist,
//! so they reach `failed` whether or not conda is installed on the host.

use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use scanforge_core::{
    ObserverHandle, ObserverRegistry, ScanOrchestrator, ScanRequest, ScanRunner, ScanSession,
    ScanStatus, SessionStore,
};

async fn setup() -> (Arc<SessionStore>, Arc<ObserverRegistry>) {
    // A single connection so every task sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = Arc::new(SessionStore::new(pool));
    store.init().await.unwrap();
    (store, Arc::new(ObserverRegistry::new()))
}

fn request(environment: &str) -> ScanRequest {
    ScanRequest {
        model_name: "llama3".to_string(),
        environment: environment.to_string(),
        tool: "garak".to_string(),
        probe: "test.Test".to_string(),
    }
}

// ============================================================================
// Event Stream Integration Tests
// ============================================================================

#[tokio::test]
async fn test_observer_receives_ordered_event_stream() {
    let (store, registry) = setup().await;
    let session = ScanSession::new(request("scanforge-it-no-such-env"));
    let session_id = session.id;
    store.create(&session).await.unwrap();

    let (handle, mut rx) = ObserverHandle::new();
    registry.join(session_id, handle).await;

    let runner = ScanRunner::new(store.clone(), registry.clone());
    runner.run(session).await;

    let mut events = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        events.push(serde_json::from_str::<serde_json::Value>(&payload).unwrap());
    }

    assert!(events.len() >= 4, "got {} events", events.len());
    assert_eq!(events[0]["type"], "status");
    assert_eq!(events[0]["status"], "running");
    assert_eq!(events[1]["type"], "command");
    assert!(events[1]["command"]
        .as_str()
        .unwrap()
        .starts_with("conda run -n scanforge-it-no-such-env"));
    assert_eq!(events[2]["type"], "output");
    assert!(events[2]["line"]
        .as_str()
        .unwrap()
        .contains("garak LLM vulnerability scanner"));

    // Terminal event: a failed status when conda ran and exited non-zero,
    // or an error when conda itself could not be spawned.
    let last = events.last().unwrap();
    let terminal = last["type"] == "error"
        || (last["type"] == "status" && last["status"] == "failed");
    assert!(terminal, "unexpected terminal event: {last}");

    let record = store.get(session_id).await.unwrap();
    assert_eq!(record.status, ScanStatus::Failed);
    assert!(record.completed_at.is_some());
    assert!(!record.output.is_empty());
}

#[tokio::test]
async fn test_concurrent_scans_do_not_cross_deliver() {
    let (store, registry) = setup().await;

    let session_a = ScanSession::new(request("scanforge-it-env-alpha"));
    let session_b = ScanSession::new(request("scanforge-it-env-beta"));
    store.create(&session_a).await.unwrap();
    store.create(&session_b).await.unwrap();

    let (handle_a, mut rx_a) = ObserverHandle::new();
    let (handle_b, mut rx_b) = ObserverHandle::new();
    registry.join(session_a.id, handle_a).await;
    registry.join(session_b.id, handle_b).await;

    let runner = ScanRunner::new(store.clone(), registry.clone());
    tokio::join!(runner.run(session_a), runner.run(session_b));

    let mut saw_alpha = false;
    while let Ok(payload) = rx_a.try_recv() {
        assert!(!payload.contains("env-beta"), "cross-delivered: {payload}");
        saw_alpha |= payload.contains("env-alpha");
    }
    assert!(saw_alpha, "observer A never saw its own command event");

    let mut saw_beta = false;
    while let Ok(payload) = rx_b.try_recv() {
        assert!(!payload.contains("env-alpha"), "cross-delivered: {payload}");
        saw_beta |= payload.contains("env-beta");
    }
    assert!(saw_beta, "observer B never saw its own command event");
}

#[tokio::test]
async fn test_detached_observer_does_not_disturb_scan() {
    let (store, registry) = setup().await;
    let session = ScanSession::new(ScanRequest {
        tool: "nmap".to_string(),
        ..request("env")
    });
    let session_id = session.id;
    store.create(&session).await.unwrap();

    let (leaver, rx_leaver) = ObserverHandle::new();
    let (stayer, mut rx_stayer) = ObserverHandle::new();
    let leaver_id = leaver.connection_id;
    registry.join(session_id, leaver).await;
    registry.join(session_id, stayer).await;

    registry.leave(session_id, leaver_id).await;
    drop(rx_leaver);

    let runner = ScanRunner::new(store.clone(), registry.clone());
    runner.run(session).await;

    // The remaining observer still gets the full stream and the scan record
    // is finalized normally.
    assert!(rx_stayer.try_recv().is_ok());
    let record = store.get(session_id).await.unwrap();
    assert_eq!(record.status, ScanStatus::Failed);
}

// ============================================================================
// Orchestrator Lifecycle Integration Tests
// ============================================================================

#[tokio::test]
async fn test_failed_scan_reaches_terminal_state() {
    let (store, registry) = setup().await;
    let orchestrator = ScanOrchestrator::new(store, registry);

    let session_id = orchestrator
        .start(request("scanforge-it-no-such-env"))
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
    loop {
        let session = orchestrator.status(session_id).await.unwrap();
        if session.status.is_terminal() {
            assert_eq!(session.status, ScanStatus::Failed);
            assert!(session.completed_at.is_some());
            assert!(!session.output.is_empty());
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "scan never reached a terminal state"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
async fn test_unknown_session_lookup_fails() {
    let (store, registry) = setup().await;
    let orchestrator = ScanOrchestrator::new(store, registry);

    assert!(orchestrator.status(Uuid::new_v4()).await.is_err());
}
