//! Session Event Broadcasting
//!
//! Fans session lifecycle events out to live subscribers (dashboard
//! WebSocket clients waiting for the QR code or the ready signal).
//!
//! The registry only holds weak references: a subscriber's lifetime belongs to
//! its connection. Dead or closed entries are skipped and pruned during
//! [`SessionEventBroadcaster::broadcast`]. There is no history; a subscriber
//! only sees events emitted after it registered.

pub mod relay;
pub mod subscriber;
pub mod terminal;

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, trace, warn};
use uuid::Uuid;

use crate::session::SessionEvent;

pub use relay::relay_session_events;
pub use subscriber::{ChannelSubscriber, DeliverError, Subscriber};

/// Status text sent when the session becomes ready.
pub const READY_TEXT: &str = "Client ready";

/// Error text sent when authentication fails.
pub const AUTH_FAILED_TEXT: &str = "Authentication failed";

/// Wire shape of a subscriber frame: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SubscriberFrame {
    /// QR challenge payload to render
    Qr(String),
    /// Session status change
    Status(String),
    /// Session error
    Error(String),
}

impl From<&SessionEvent> for SubscriberFrame {
    fn from(event: &SessionEvent) -> Self {
        match event {
            SessionEvent::Challenge(code) => Self::Qr(code.clone()),
            SessionEvent::Ready => Self::Status(READY_TEXT.to_string()),
            // The reason stays in the server log.
            SessionEvent::AuthFailed(_) => Self::Error(AUTH_FAILED_TEXT.to_string()),
        }
    }
}

/// Registry of live subscribers.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone, Default)]
pub struct SessionEventBroadcaster {
    subscribers: Arc<DashMap<Uuid, Weak<dyn Subscriber>>>,
}

impl SessionEventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for all future events.
    ///
    /// Only a weak reference is kept; dropping the last `Arc` unsubscribes.
    pub fn subscribe<S: Subscriber + 'static>(&self, subscriber: &Arc<S>) -> Uuid {
        let weak: Weak<dyn Subscriber> = Arc::downgrade(subscriber) as Weak<S>;
        let id = Uuid::now_v7();
        self.subscribers.insert(id, weak);
        id
    }

    /// Remove a subscriber eagerly.
    pub fn unsubscribe(&self, id: Uuid) {
        self.subscribers.remove(&id);
    }

    /// Number of subscribers that are still alive.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .retain(|_, weak| weak.upgrade().is_some_and(|s| s.is_open()));
        self.subscribers.len()
    }

    /// Serialize `event` once and hand it to every open subscriber.
    ///
    /// Closed subscribers are skipped and pruned. Returns how many subscribers
    /// accepted the frame.
    pub fn broadcast(&self, event: &SessionEvent) -> usize {
        let frame: Arc<str> = match serde_json::to_string(&SubscriberFrame::from(event)) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(kind = event.kind(), "Failed to serialize session event: {}", e);
                return 0;
            }
        };

        // Snapshot so deliveries never run while a shard lock is held.
        let snapshot: Vec<(Uuid, Weak<dyn Subscriber>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        for (id, weak) in snapshot {
            let Some(subscriber) = weak.upgrade().filter(|s| s.is_open()) else {
                trace!(subscriber = %id, "Pruning closed subscriber");
                self.subscribers.remove(&id);
                continue;
            };

            match subscriber.deliver(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(DeliverError::Closed) => {
                    self.subscribers.remove(&id);
                }
                Err(DeliverError::Full) => {
                    warn!(subscriber = %id, kind = event.kind(), "Subscriber lagging, frame dropped");
                }
            }
        }

        delivered
    }
}
