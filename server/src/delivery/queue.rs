//! Paced Delivery Queue
//!
//! All outbound messages funnel through one [`DeliveryQueue`] and are handed to
//! the session one at a time, at least `interval` apart. The session throttles
//! bursty automated senders, so sends are never issued concurrently.
//!
//! ```text
//! enqueue() ──► [pending FIFO] ──► drain loop ──► session.send()
//!  (many producers)                 (at most one)     │
//!                                        ▲            ▼
//!                                        └──── sleep(interval)
//! ```
//!
//! State machine:
//! - **Idle**: nothing pending, no drain loop.
//! - **Draining**: entered by the one `enqueue` that finds the queue idle.
//!   Left only by the drain loop itself, after its last pacing sleep, in the
//!   same critical section that observes the queue empty.
//!
//! Each message gets exactly one attempt. Failures are logged and dropped;
//! the loop moves on to the next message.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::stats::{DeliveryStats, QueueSnapshot};
use crate::session::{SessionCapability, SessionError};

/// Queue tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Minimum spacing between consecutive send attempts.
    pub interval: Duration,
    /// Optional bound on a single send. Expiry counts as a failed attempt.
    pub send_timeout: Option<Duration>,
}

impl QueueConfig {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            send_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

/// One pending outbound message.
#[derive(Debug)]
struct QueuedMessage {
    destination: String,
    payload: String,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedMessage>,
    draining: bool,
    last_attempt_at: Option<DateTime<Utc>>,
}

struct Inner {
    session: Arc<dyn SessionCapability>,
    config: QueueConfig,
    state: Mutex<QueueState>,
    /// Mirrors `QueueState::draining`; only written while `state` is locked.
    draining_tx: watch::Sender<bool>,
    stats: DeliveryStats,
}

/// FIFO, paced, single-sender outbound queue.
///
/// Cheap to clone; clones share the same queue.
#[derive(Clone)]
pub struct DeliveryQueue {
    inner: Arc<Inner>,
}

impl DeliveryQueue {
    /// Create an idle queue draining into `session`.
    #[must_use]
    pub fn new(session: Arc<dyn SessionCapability>, config: QueueConfig) -> Self {
        let (draining_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                session,
                config,
                state: Mutex::new(QueueState::default()),
                draining_tx,
                stats: DeliveryStats::default(),
            }),
        }
    }

    /// Append a message and make sure a drain loop is running.
    ///
    /// Returns as soon as the message is queued; acceptance is not delivery.
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(&self, destination: impl Into<String>, payload: impl Into<String>) {
        let message = QueuedMessage {
            destination: destination.into(),
            payload: payload.into(),
        };
        self.inner.stats.record_enqueued();

        let start_drain = {
            let mut state = self.inner.lock_state();
            debug!(
                destination = %message.destination,
                position = state.pending.len(),
                "Message queued"
            );
            state.pending.push_back(message);
            if state.draining {
                false
            } else {
                state.draining = true;
                self.inner.draining_tx.send_replace(true);
                true
            }
        };

        if start_drain {
            tokio::spawn(Arc::clone(&self.inner).drain());
        }
    }

    /// Number of messages waiting to be attempted.
    pub fn pending(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    /// Whether a drain loop is currently active.
    pub fn is_draining(&self) -> bool {
        self.inner.lock_state().draining
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.inner.stats
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.lock_state();
        QueueSnapshot {
            pending: state.pending.len(),
            draining: state.draining,
            enqueued: self.inner.stats.enqueued(),
            sent: self.inner.stats.sent(),
            failed: self.inner.stats.failed(),
            last_attempt_at: state.last_attempt_at,
        }
    }

    /// Resolve once the queue is Idle: nothing pending and no drain loop.
    pub async fn idle(&self) {
        let mut rx = self.inner.draining_tx.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|draining| !*draining).await;
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // Never held across an await; a poisoned guard still holds a valid queue.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Next message, or transition to Idle if there is none.
    fn next_or_idle(&self) -> Option<QueuedMessage> {
        let mut state = self.lock_state();
        let next = state.pending.pop_front();
        if next.is_none() {
            state.draining = false;
            self.draining_tx.send_replace(false);
        }
        next
    }

    async fn drain(self: Arc<Self>) {
        debug!("Drain loop started");

        while let Some(message) = self.next_or_idle() {
            let outcome = AssertUnwindSafe(self.attempt(&message))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let reason = panic_message(&*panic);
                    error!(panic = %reason, "Session send panicked");
                    Err(SessionError::Aborted(reason))
                });

            self.lock_state().last_attempt_at = Some(Utc::now());

            match outcome {
                Ok(()) => {
                    self.stats.record_sent();
                    info!(destination = %message.destination, "Message delivered");
                }
                Err(e) => {
                    self.stats.record_failed();
                    warn!(
                        destination = %message.destination,
                        reason = e.as_label(),
                        error = %e,
                        "Message delivery failed, dropping"
                    );
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }

        debug!("Drain loop idle");
    }

    async fn attempt(&self, message: &QueuedMessage) -> Result<(), SessionError> {
        let send = self.session.send(&message.destination, &message.payload);
        match self.config.send_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .unwrap_or_else(|_elapsed| Err(SessionError::Timeout(limit))),
            None => send.await,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
