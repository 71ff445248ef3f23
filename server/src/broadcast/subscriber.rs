//! Broadcast subscribers.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Why a frame was not handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliverError {
    /// The subscriber is gone and should be pruned.
    #[error("subscriber closed")]
    Closed,
    /// The subscriber is alive but not keeping up; this frame is dropped.
    #[error("subscriber buffer full")]
    Full,
}

/// A receiver of serialized session events.
pub trait Subscriber: Send + Sync {
    /// Whether the subscriber can still receive frames.
    fn is_open(&self) -> bool;

    /// Hand over one frame without blocking.
    fn deliver(&self, frame: Arc<str>) -> Result<(), DeliverError>;
}

/// Subscriber backed by a bounded channel; the receiving half is drained by
/// the connection task (see `ws`).
pub struct ChannelSubscriber {
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiver its frames arrive on.
    #[must_use]
    pub fn channel(buffer: usize) -> (Arc<Self>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Arc::new(Self { tx }), rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn deliver(&self, frame: Arc<str>) -> Result<(), DeliverError> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliverError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliverError::Closed,
        })
    }
}
