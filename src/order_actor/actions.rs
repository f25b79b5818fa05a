use crate::domain::{Order, OrderStatus};

/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves the order along its lifecycle.
    ///
    /// # Errors
    /// Fails with `InvalidTransition` when the table in
    /// [`OrderStatus::can_transition_to`] does not allow the move.
    TransitionStatus(OrderStatus),
    /// Marks the order as paid with the gateway's payment reference.
    RecordPayment { payment_id: String },
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    TransitionStatus { previous: OrderStatus, order: Order },
    RecordPayment(Order),
}
