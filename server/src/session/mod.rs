//! Messaging Session
//!
//! The single WhatsApp session every outbound message goes through. The
//! session itself lives in an external bridge process; this module defines the
//! capability the rest of the server consumes and the lifecycle events it
//! emits.

pub mod bridge;
pub mod error;
pub mod events;

use async_trait::async_trait;

pub use bridge::BridgeSession;
pub use error::SessionError;
pub use events::SessionEvent;

/// Operations the server needs from the messaging session.
///
/// Lifecycle events are not part of this trait; providers deliver them on a
/// channel (see [`BridgeSession::spawn_event_stream`]).
#[async_trait]
pub trait SessionCapability: Send + Sync {
    /// Whether `address` belongs to a registered account.
    async fn is_valid_address(&self, address: &str) -> Result<bool, SessionError>;

    /// Deliver `payload` to `address`.
    async fn send(&self, address: &str, payload: &str) -> Result<(), SessionError>;
}
