use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use super::{ApiJson, AppState, Authenticated};
use crate::error::ApiError;
use crate::payment::{PaymentReceipt, PaymentSession};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment/create-order", post(create_session))
        .route("/payment/verify", post(verify))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
}

async fn create_session(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    ApiJson(body): ApiJson<SessionRequest>,
) -> Result<Json<PaymentSession>, ApiError> {
    let order = state.orders.get_order_record(&identity, body.order_id).await?;
    Ok(Json(state.payments.create_session(&order, Utc::now())))
}

async fn verify(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    ApiJson(body): ApiJson<VerifyRequest>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let order = state
        .orders
        .record_payment(&identity, body.order_id, body.payment_id)
        .await?;
    Ok(Json(PaymentReceipt::verified(order)))
}
