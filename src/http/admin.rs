use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{Admin, ApiJson, AppState};
use crate::analytics::{summarise, Summary};
use crate::domain::{
    Category, MenuItem, MenuItemCreate, MenuItemPatch, MenuQuery, NutritionalInfo, OrderFilter, OrderStatus,
    OrderView,
};
use crate::error::ApiError;
use crate::images::ImageUpload;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/menu", get(list_menu).post(create_menu_item))
        .route("/admin/menu/:id", put(update_menu_item).delete(delete_menu_item))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/status", put(update_status))
        .route("/admin/analytics", get(analytics))
}

/// Text fields plus the optional `image` file of a menu form.
#[derive(Debug, Default)]
pub struct MenuForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl MenuForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("Malformed form: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed image: {e}")))?;
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload { content_type, bytes: bytes.to_vec() });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed field {name}: {e}")))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<&str, ApiError> {
        self.text(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::Validation(format!("{key} is required")))
    }

    fn price(&self) -> Result<Option<f64>, ApiError> {
        self.text("price")
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| ApiError::Validation(format!("Invalid price: {raw}")))
            })
            .transpose()
    }

    fn category(&self) -> Result<Option<Category>, ApiError> {
        self.text("category")
            .map(|raw| raw.parse::<Category>().map_err(ApiError::Validation))
            .transpose()
    }

    fn available(&self) -> Result<Option<bool>, ApiError> {
        self.text("available")
            .map(|raw| {
                raw.trim()
                    .parse::<bool>()
                    .map_err(|_| ApiError::Validation(format!("Invalid available flag: {raw}")))
            })
            .transpose()
    }

    /// `ingredients` arrives as a JSON array string.
    fn ingredients(&self) -> Result<Option<Vec<String>>, ApiError> {
        self.text("ingredients")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                serde_json::from_str(raw).map_err(|_| ApiError::Validation("ingredients must be a JSON array".to_string()))
            })
            .transpose()
    }

    fn nutritional_info(&self) -> Result<Option<NutritionalInfo>, ApiError> {
        self.text("nutritionalInfo")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|_| ApiError::Validation("nutritionalInfo must be a JSON object".to_string()))
            })
            .transpose()
    }

    pub fn into_create(self) -> Result<(MenuItemCreate, Option<ImageUpload>), ApiError> {
        let payload = MenuItemCreate {
            name: self.required("name")?.to_string(),
            description: self.text("description").unwrap_or_default().to_string(),
            price: self.price()?.ok_or_else(|| ApiError::Validation("price is required".to_string()))?,
            category: self
                .category()?
                .ok_or_else(|| ApiError::Validation("category is required".to_string()))?,
            image: None,
            available: self.available()?.unwrap_or(true),
            ingredients: self.ingredients()?.unwrap_or_default(),
            nutritional_info: self.nutritional_info()?,
        };
        Ok((payload, self.image))
    }

    pub fn into_patch(self) -> Result<(MenuItemPatch, Option<ImageUpload>), ApiError> {
        let patch = MenuItemPatch {
            name: self.text("name").map(str::to_string),
            description: self.text("description").map(str::to_string),
            price: self.price()?,
            category: self.category()?,
            image: None,
            available: self.available()?,
            ingredients: self.ingredients()?,
            nutritional_info: self.nutritional_info()?,
        };
        Ok((patch, self.image))
    }
}

async fn list_menu(State(state): State<AppState>, Admin(_): Admin) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(state.menu.list_menu(MenuQuery::everything()).await?))
}

#[instrument(skip_all, fields(admin = %identity.user_id))]
async fn create_menu_item(
    State(state): State<AppState>,
    Admin(identity): Admin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    let (payload, image) = MenuForm::read(multipart).await?.into_create()?;
    let item = state.menu.create_menu_item(payload, image).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip_all, fields(admin = %identity.user_id, item_id = %id))]
async fn update_menu_item(
    State(state): State<AppState>,
    Admin(identity): Admin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<MenuItem>, ApiError> {
    let (patch, image) = MenuForm::read(multipart).await?.into_patch()?;
    Ok(Json(state.menu.update_menu_item(id, patch, image).await?))
}

#[instrument(skip_all, fields(admin = %identity.user_id, item_id = %id))]
async fn delete_menu_item(
    State(state): State<AppState>,
    Admin(identity): Admin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.menu.delete_menu_item(id).await?;
    info!("Menu item deleted");
    Ok(Json(json!({ "message": "Menu item deleted successfully" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

async fn list_orders(
    State(state): State<AppState>,
    Admin(identity): Admin,
    Query(params): Query<OrderParams>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let status = params
        .status
        .filter(|s| !s.is_empty() && s != "all")
        .map(|s| s.parse::<OrderStatus>().map_err(ApiError::Validation))
        .transpose()?;
    let filter = OrderFilter { status, limit: params.limit };
    Ok(Json(state.orders.list_orders(&identity, filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

async fn update_status(
    State(state): State<AppState>,
    Admin(identity): Admin,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<OrderView>, ApiError> {
    let status = body.status.parse::<OrderStatus>().map_err(ApiError::Validation)?;
    Ok(Json(state.orders.transition_status(&identity, id, status).await?))
}

async fn analytics(State(state): State<AppState>, Admin(identity): Admin) -> Result<Json<Summary>, ApiError> {
    let orders = state.orders.all_orders(&identity).await?;
    Ok(Json(summarise(&orders, Utc::now())))
}
