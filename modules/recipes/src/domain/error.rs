use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Also returned for recipes owned by someone else.
    #[error("Recipe not found: {id}")]
    RecipeNotFound { id: Uuid },

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unknown tag ids: {ids:?}")]
    UnknownTags { ids: Vec<Uuid> },

    #[error("Unknown ingredient ids: {ids:?}")]
    UnknownIngredients { ids: Vec<Uuid> },

    #[error("Upload a valid image: {message}")]
    InvalidImage { message: String },

    #[error("Image too large: {size} bytes (max: {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Media storage error: {message}")]
    Storage { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn recipe_not_found(id: Uuid) -> Self {
        Self::RecipeNotFound { id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// JSON pointer of the offending request field, for 400 responses.
    pub fn pointer(&self) -> Option<String> {
        match self {
            Self::Validation { field, .. } => Some(format!("/{field}")),
            Self::UnknownTags { .. } => Some("/tags".to_string()),
            Self::UnknownIngredients { .. } => Some("/ingredients".to_string()),
            Self::InvalidImage { .. } | Self::ImageTooLarge { .. } => Some("/image".to_string()),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::database(e.to_string())
    }
}
