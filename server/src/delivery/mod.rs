//! Outbound Delivery
//!
//! Paced, single-sender queue in front of the messaging session.

pub mod queue;
pub mod stats;

pub use queue::{DeliveryQueue, QueueConfig};
pub use stats::{DeliveryStats, QueueSnapshot};
