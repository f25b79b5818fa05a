use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::AppState;
use crate::domain::{Category, MenuItem, MenuQuery};
use crate::error::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/menu", get(list))
        .route("/menu/categories/all", get(categories))
        .route("/menu/:id", get(fetch))
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuParams {
    pub category: Option<String>,
    pub search: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<MenuParams>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let query = MenuQuery {
        category: params.category,
        search: params.search,
        include_unavailable: false,
    };
    Ok(Json(state.menu.list_menu(query).await?))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<MenuItem>, ApiError> {
    Ok(Json(state.menu.fetch_menu_item(id).await?))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.menu.categories().await?))
}
