use thiserror::Error;

use crate::actor_framework::FrameworkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MenuError {
    #[error("Menu item not found: {0}")]
    NotFound(String),
    #[error("Menu validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError<MenuError>> for MenuError {
    fn from(err: FrameworkError<MenuError>) -> Self {
        match err {
            FrameworkError::NotFound(id) => MenuError::NotFound(id),
            FrameworkError::Entity(e) => e,
            other => MenuError::ActorCommunicationError(other.to_string()),
        }
    }
}
