//! Best-effort real-time notifications.
//!
//! Delivery is at-most-once and unacknowledged: a session whose queue is full
//! misses the event, a disconnected session is dropped from the registry.
//! Clients reconcile through regular reads; nothing here is a source of truth.

pub mod events;
pub mod hub;

pub use events::*;
pub use hub::*;
