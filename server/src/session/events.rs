//! Session Lifecycle Events

use serde::Deserialize;

/// Asynchronous session-state notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A QR challenge must be scanned to pair the session.
    Challenge(String),
    /// The session authenticated and can send.
    Ready,
    /// Authentication failed; sends keep failing until the session recovers.
    AuthFailed(String),
}

impl SessionEvent {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Challenge(_) => "challenge",
            Self::Ready => "ready",
            Self::AuthFailed(_) => "auth_failed",
        }
    }
}

/// Event frame as emitted by the session bridge's `/events` stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub(crate) enum BridgeEvent {
    Qr {
        code: String,
    },
    Ready,
    AuthFailure {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl From<BridgeEvent> for SessionEvent {
    fn from(event: BridgeEvent) -> Self {
        match event {
            BridgeEvent::Qr { code } => Self::Challenge(code),
            BridgeEvent::Ready => Self::Ready,
            BridgeEvent::AuthFailure { reason } => {
                Self::AuthFailed(reason.unwrap_or_else(|| "unknown".to_string()))
            }
        }
    }
}

/// Parse one text frame from the bridge event stream.
pub(crate) fn parse_bridge_event(text: &str) -> Result<SessionEvent, serde_json::Error> {
    serde_json::from_str::<BridgeEvent>(text).map(SessionEvent::from)
}
