use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsersError {
    #[error("User not found: {id}")]
    NotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Internal error")]
    Internal,
}
