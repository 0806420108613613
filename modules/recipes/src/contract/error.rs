use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipesError {
    #[error("Recipe not found: {id}")]
    NotFound { id: Uuid },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}
