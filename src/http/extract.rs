use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use crate::auth::{bearer_token, Capability};
use crate::domain::Identity;
use crate::error::ApiError;

/// Any caller holding a valid credential.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

/// A caller whose account carries the admin role.
#[derive(Debug, Clone)]
pub struct Admin(pub Identity);

async fn authorize(parts: &Parts, state: &AppState, capability: Capability) -> Result<Identity, ApiError> {
    let header = parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    Ok(state.gate.authorize(bearer_token(header), capability).await?)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Capability::Authenticated).await.map(Self)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Capability::Administrator).await.map(Self)
    }
}

/// JSON body whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
