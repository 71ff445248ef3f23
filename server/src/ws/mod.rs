//! WebSocket Handler
//!
//! Live session status for dashboards. Each connection registers a
//! [`ChannelSubscriber`] with the broadcaster and receives QR, ready and
//! auth-failure frames until it disconnects. Client frames are ignored.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use crate::api::AppState;
use crate::broadcast::{ChannelSubscriber, SessionEventBroadcaster};

/// Router for the standalone subscriber listener (`ws://host:WS_PORT/`).
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(handler))
}

/// WebSocket upgrade handler.
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let buffer = state.config.subscriber_buffer;
    ws.on_upgrade(move |socket| handle_socket(socket, state.broadcaster, buffer))
}

/// Handle WebSocket connection.
async fn handle_socket(socket: WebSocket, broadcaster: SessionEventBroadcaster, buffer: usize) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (subscriber, mut frames) = ChannelSubscriber::channel(buffer);
    let id = broadcaster.subscribe(&subscriber);
    info!(subscriber = %id, "WebSocket subscriber connected");

    // Forward broadcast frames to the socket
    let sender_handle = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if ws_sender
                .send(Message::Text(frame.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Drain incoming messages until the client goes away
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(subscriber = %id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Cleanup
    sender_handle.abort();
    broadcaster.unsubscribe(id);
    drop(subscriber);

    info!(subscriber = %id, "WebSocket subscriber disconnected");
}
