//! HTTP-facing error taxonomy. Domain errors from every layer collapse into
//! [`ApiError`], which renders as `{ "message": ... }` with a mapped status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::menu_actor::MenuError;
use crate::notify::NotifyError;
use crate::order_actor::OrderError;
use crate::user_actor::UserError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Self::Internal(detail) => {
                // Logged, never returned.
                error!(detail = %detail, "Internal error");
                "Server error".to_string()
            }
            Self::Validation(m)
            | Self::Authentication(m)
            | Self::Authorization(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Upstream(m) => m,
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => ApiError::NotFound("Order not found".to_string()),
            OrderError::InvalidMenuItem(_) | OrderError::ValidationError(_) => ApiError::Validation(err.to_string()),
            OrderError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            OrderError::Forbidden(m) => ApiError::Authorization(m),
            OrderError::ActorCommunicationError(m) => ApiError::Internal(m),
        }
    }
}

impl From<MenuError> for ApiError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::NotFound(_) => ApiError::NotFound("Menu item not found".to_string()),
            MenuError::ValidationError(_) => ApiError::Validation(err.to_string()),
            MenuError::ActorCommunicationError(m) => ApiError::Internal(m),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            UserError::AlreadyExists(_) => ApiError::Conflict("User already exists".to_string()),
            UserError::ValidationError(m) => ApiError::Validation(m),
            UserError::InvalidCredentials => ApiError::Authentication(err.to_string()),
            UserError::ActorCommunicationError(m) => ApiError::Internal(m),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::Expired => {
                ApiError::Authentication(err.to_string())
            }
            AuthError::Forbidden(m) => ApiError::Authorization(m),
            AuthError::Backend(m) => ApiError::Internal(m),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::NotAdmin => ApiError::Authorization(err.to_string()),
            NotifyError::UnknownSession(_) => ApiError::NotFound(err.to_string()),
            NotifyError::ActorCommunicationError(m) => ApiError::Internal(m),
        }
    }
}
