use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiJson, AppState, Authenticated};
use crate::clients::PlaceOrder;
use crate::domain::{LineRequest, OrderType, OrderView};
use crate::error::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create))
        .route("/orders/my-orders", get(my_orders))
        .route("/orders/:id", get(fetch))
}

/// Any `totalAmount` sent by the client is ignored; the total is derived
/// from the lines.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<LineRequest>,
    pub order_type: OrderType,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let request = PlaceOrder {
        items: body.items,
        order_type: body.order_type,
        delivery_address: body.delivery_address,
        notes: body.notes,
    };
    let view = state.orders.create_order(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn my_orders(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.orders.list_my_orders(&identity).await?))
}

async fn fetch(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(state.orders.get_order(&identity, id).await?))
}
