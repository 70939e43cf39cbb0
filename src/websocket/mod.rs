//! WebSocket module for scanforge
//!
//! Provides the real-time endpoint:
//! - /ws/terminal/:session_id - per-session scan event stream

pub mod terminal;

pub use terminal::terminal_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new().route("/ws/terminal/:session_id", get(terminal_handler))
}
