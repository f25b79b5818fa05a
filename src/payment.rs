//! Mock payment gateway. Sessions are fabricated locally and payment proofs
//! are accepted without signature verification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::{Order, OrderView};

pub const CURRENCY: &str = "INR";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub order_id: String,
    /// Minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub success: bool,
    pub message: String,
    pub order: OrderView,
}

impl PaymentReceipt {
    pub fn verified(order: OrderView) -> Self {
        Self {
            success: true,
            message: "Payment verified successfully".to_string(),
            order,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    key_id: String,
}

impl PaymentGateway {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self { key_id: key_id.into() }
    }

    pub fn create_session(&self, order: &Order, now: DateTime<Utc>) -> PaymentSession {
        let session = PaymentSession {
            order_id: format!("pay_{}", now.timestamp_millis()),
            amount: (order.total_amount * 100.0).round() as i64,
            currency: CURRENCY.to_string(),
            key: self.key_id.clone(),
        };
        info!(order_id = %order.id, payment_order = %session.order_id, "Payment session created");
        session
    }
}
