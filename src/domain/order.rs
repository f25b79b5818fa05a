use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{MenuItem, User};

/// Lifecycle of an order.
///
/// ```text
/// Pending -> Preparing -> Ready -> Completed
///    |           |
///    +-----------+--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (*self, next),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (Pending, Cancelled)
                | (Preparing, Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Preparing" => Ok(OrderStatus::Preparing),
            "Ready" => Ok(OrderStatus::Ready),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// One catalog item within an order, with the price captured when it was placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_item: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl OrderLine {
    pub fn extended_price(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// A line as submitted by the customer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub menu_item: String,
    pub quantity: u32,
    pub price: f64,
}

/// Represents a customer order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer: String,
    pub items: Vec<OrderLine>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub delivery_address: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new order. The total is derived from `items`.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer: String,
    pub items: Vec<OrderLine>,
    pub order_type: OrderType,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

pub fn total_of(lines: &[OrderLine]) -> f64 {
    lines.iter().map(OrderLine::extended_price).sum()
}

/// Public fields of the ordering customer, shown alongside the order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&User> for CustomerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// A line with its menu item resolved against the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    /// `None` once the item has been removed from the catalog.
    pub menu_item: Option<MenuItem>,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// Read model of an order as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub customer: Option<CustomerSummary>,
    pub customer_id: String,
    pub items: Vec<LineView>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub delivery_address: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn resolve(
        order: Order,
        customer: Option<CustomerSummary>,
        lookup: impl Fn(&str) -> Option<MenuItem>,
    ) -> Self {
        let items = order
            .items
            .into_iter()
            .map(|line| LineView {
                menu_item: lookup(&line.menu_item),
                menu_item_id: line.menu_item,
                name: line.name,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        Self {
            id: order.id,
            customer,
            customer_id: order.customer,
            items,
            total_amount: order.total_amount,
            status: order.status,
            order_type: order.order_type,
            delivery_address: order.delivery_address,
            payment_status: order.payment_status,
            payment_id: order.payment_id,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Admin listing refinements.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub limit: Option<usize>,
}
