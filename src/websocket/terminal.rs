//! Terminal WebSocket handler
//!
//! Attaches a connection to one scan session's event stream. Events produced
//! by the process runner are fanned out through the observer registry; this
//! handler drains the observer's queue into the socket until either side
//! disconnects. The session finishing does not close the socket.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use scanforge_core::{ObserverHandle, ObserverRegistry};

/// WebSocket upgrade handler
pub async fn terminal_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<Uuid>,
    Extension(registry): Extension<Arc<ObserverRegistry>>,
) -> impl IntoResponse {
    info!(%session_id, "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, registry))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, session_id: Uuid, registry: Arc<ObserverRegistry>) {
    let (mut sender, mut receiver) = socket.split();

    let (handle, mut events) = ObserverHandle::new();
    let connection_id = handle.connection_id;
    registry.join(session_id, handle).await;
    info!(%session_id, %connection_id, "observer attached");

    // Forward registry events into the socket until the queue or socket closes
    let forward = tokio::spawn(async move {
        while let Some(payload) = events.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // Clients do not speak on this stream; drain inbound frames so pings and
    // close handshakes are serviced, and stop when the connection ends.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                debug!(%connection_id, "WebSocket closed by client");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    registry.leave(session_id, connection_id).await;
    forward.abort();
    info!(%session_id, %connection_id, "observer detached");
}
