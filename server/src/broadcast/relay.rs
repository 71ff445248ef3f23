//! Session lifecycle relay.

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{terminal, SessionEventBroadcaster};
use crate::session::SessionEvent;

/// Forward session events to subscribers in the order they arrive.
///
/// QR challenges are also drawn on stdout so the session can be paired from
/// the server console. Runs until every sender of `events` is dropped.
pub async fn relay_session_events(
    mut events: mpsc::Receiver<SessionEvent>,
    broadcaster: SessionEventBroadcaster,
) {
    while let Some(event) = events.recv().await {
        match &event {
            SessionEvent::Challenge(code) => {
                info!(code = %code, "New QR code issued, waiting for scan");
                terminal::print_qr(code);
            }
            SessionEvent::Ready => info!("WhatsApp session ready"),
            SessionEvent::AuthFailed(reason) => {
                error!(reason = %reason, "WhatsApp session authentication failed");
            }
        }

        let delivered = broadcaster.broadcast(&event);
        debug!(kind = event.kind(), delivered, "Session event broadcast");
    }

    info!("Session event stream closed");
}
