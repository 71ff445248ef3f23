//! WA Gateway Server
//!
//! HTTP gateway that queues outbound WhatsApp messages and delivers them
//! through a single session, one at a time and at a fixed pace, while
//! streaming session lifecycle events (QR challenge, ready, auth failure) to
//! connected WebSocket clients.

pub mod address;
pub mod api;
pub mod broadcast;
pub mod config;
pub mod delivery;
pub mod session;
pub mod templates;
pub mod ws;
