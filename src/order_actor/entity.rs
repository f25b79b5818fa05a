use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{total_of, Order, OrderCreate, OrderStatus, OrderType, PaymentStatus};
use super::{OrderAction, OrderActionResult, OrderError};

fn validate(params: &OrderCreate) -> Result<(), OrderError> {
    if params.items.is_empty() {
        return Err(OrderError::ValidationError("Order must contain at least one item".to_string()));
    }
    for line in &params.items {
        if line.quantity < 1 {
            return Err(OrderError::ValidationError(format!(
                "Quantity for {} must be at least 1",
                line.menu_item
            )));
        }
        if !line.price.is_finite() || line.price < 0.0 {
            return Err(OrderError::ValidationError(format!(
                "Invalid price for {}: {}",
                line.menu_item, line.price
            )));
        }
    }
    let has_address = params
        .delivery_address
        .as_deref()
        .is_some_and(|address| !address.trim().is_empty());
    if params.order_type == OrderType::Delivery && !has_address {
        return Err(OrderError::ValidationError(
            "Delivery address is required for delivery orders".to_string(),
        ));
    }
    Ok(())
}

impl Entity for Order {
    type Id = String;
    type CreatePayload = OrderCreate;
    type Patch = ();
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from creation parameters.
    ///
    /// The total is computed here from the captured line prices, so the stored
    /// order always satisfies `total == Σ price × quantity`. New orders start
    /// `Pending` with payment `pending`.
    fn from_create(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        validate(&params)?;
        let now = Utc::now();
        Ok(Self {
            id,
            customer: params.customer,
            total_amount: total_of(&params.items),
            items: params.items,
            status: OrderStatus::Pending,
            order_type: params.order_type,
            delivery_address: params.delivery_address,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            notes: params.notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Orders are only changed through actions.
    fn on_update(&mut self, _patch: ()) -> Result<(), OrderError> {
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::TransitionStatus(next) => {
                let previous = self.status;
                if !previous.can_transition_to(next) {
                    return Err(OrderError::InvalidTransition { from: previous, to: next });
                }
                self.status = next;
                self.updated_at = Utc::now();
                Ok(OrderActionResult::TransitionStatus { previous, order: self.clone() })
            }
            OrderAction::RecordPayment { payment_id } => {
                self.payment_status = PaymentStatus::Completed;
                self.payment_id = Some(payment_id);
                self.updated_at = Utc::now();
                Ok(OrderActionResult::RecordPayment(self.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderLine;

    fn line(quantity: u32, price: f64) -> OrderLine {
        OrderLine { menu_item: "m1".into(), name: "Latte".into(), quantity, price }
    }

    fn params(order_type: OrderType, address: Option<&str>) -> OrderCreate {
        OrderCreate {
            customer: "user_1".into(),
            items: vec![line(2, 120.0), line(1, 150.0)],
            order_type,
            delivery_address: address.map(str::to_string),
            notes: None,
        }
    }

    #[test]
    fn test_create_computes_total_and_initial_state() {
        let order = Order::from_create("order_1".into(), params(OrderType::Pickup, None)).unwrap();
        assert_eq!(order.total_amount, 390.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_delivery_requires_address() {
        let err = Order::from_create("o".into(), params(OrderType::Delivery, None)).unwrap_err();
        assert!(matches!(err, OrderError::ValidationError(_)));

        let err = Order::from_create("o".into(), params(OrderType::Delivery, Some("  "))).unwrap_err();
        assert!(matches!(err, OrderError::ValidationError(_)));

        assert!(Order::from_create("o".into(), params(OrderType::Delivery, Some("1 Bean St"))).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_zero_quantity_lines() {
        let mut empty = params(OrderType::Pickup, None);
        empty.items.clear();
        assert!(Order::from_create("o".into(), empty).is_err());

        let mut zero = params(OrderType::Pickup, None);
        zero.items[0].quantity = 0;
        assert!(Order::from_create("o".into(), zero).is_err());

        let mut negative = params(OrderType::Pickup, None);
        negative.items[1].price = -1.0;
        assert!(Order::from_create("o".into(), negative).is_err());
    }

    #[test]
    fn test_illegal_transition_leaves_status() {
        let mut order = Order::from_create("o".into(), params(OrderType::Pickup, None)).unwrap();
        let err = order
            .handle_action(OrderAction::TransitionStatus(OrderStatus::Completed))
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition { from: OrderStatus::Pending, to: OrderStatus::Completed }
        );
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_record_payment_marks_completed() {
        let mut order = Order::from_create("o".into(), params(OrderType::Pickup, None)).unwrap();
        order
            .handle_action(OrderAction::RecordPayment { payment_id: "pay_1".into() })
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.payment_id.as_deref(), Some("pay_1"));
    }
}
