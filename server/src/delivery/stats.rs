//! Delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Monotonic counters updated by producers and the drain loop.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    enqueued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the queue, served by `GET /api/queue`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QueueSnapshot {
    /// Messages waiting for the drain loop
    pub pending: usize,
    /// Whether a drain loop is active
    pub draining: bool,
    /// Messages accepted since startup
    pub enqueued: u64,
    /// Messages the session accepted
    pub sent: u64,
    /// Messages dropped after a failed attempt
    pub failed: u64,
    /// When the last send attempt finished
    pub last_attempt_at: Option<DateTime<Utc>>,
}
