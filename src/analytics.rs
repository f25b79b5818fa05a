//! Dashboard aggregates over the order collection.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::domain::{Order, PaymentStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_orders: usize,
    pub today_orders: usize,
    pub month_orders: usize,
    pub total_revenue: f64,
    pub today_revenue: f64,
    pub month_revenue: f64,
}

/// Counts every order; revenue only includes orders whose payment completed.
/// Day and month boundaries are taken in UTC.
pub fn summarise(orders: &[Order], now: DateTime<Utc>) -> Summary {
    let day_start = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
    let month_start = now
        .date_naive()
        .with_day(1)
        .map(|first| Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)))
        .unwrap_or(day_start);

    orders.iter().fold(Summary::default(), |mut summary, order| {
        let revenue = if order.payment_status == PaymentStatus::Completed {
            order.total_amount
        } else {
            0.0
        };
        summary.total_orders += 1;
        summary.total_revenue += revenue;
        if order.created_at >= month_start {
            summary.month_orders += 1;
            summary.month_revenue += revenue;
        }
        if order.created_at >= day_start {
            summary.today_orders += 1;
            summary.today_revenue += revenue;
        }
        summary
    })
}
