use serde::Serialize;

/// Name of the event broadcast to the administrators group on order creation.
pub const NEW_ORDER: &str = "new-order";

/// Per-order topic name, e.g. `order-42`.
pub fn order_topic(order_id: &str) -> String {
    format!("order-{order_id}")
}

/// One frame pushed to a connected session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event: String,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { event: event.into(), payload }
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, PartialEq)]
pub enum Audience {
    /// Every session that joined the administrators group.
    Admins,
    /// Sessions of the order's customer, plus sessions watching the order.
    Order { order_id: String, customer_id: String },
}
