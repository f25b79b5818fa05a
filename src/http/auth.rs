use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{ApiJson, AppState, Authenticated};
use crate::clients::Registration;
use crate::domain::{User, UserPatch};
use crate::error::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me).put(update_profile))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile fields a customer may change. Email and role are fixed.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state
        .users
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            phone: body.phone,
            address: body.address,
        })
        .await?;
    let token = state.gate.issue(&user)?;
    info!(user_id = %user.id, "Customer registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.users.authenticate(&body.email, &body.password).await?;
    let token = state.gate.issue(&user)?;
    Ok(Json(AuthResponse { token, user }))
}

async fn me(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get_user(identity.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn update_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let patch = UserPatch {
        name: body.name,
        phone: body.phone,
        address: body.address,
    };
    Ok(Json(state.users.update_user(identity.user_id, patch).await?))
}
