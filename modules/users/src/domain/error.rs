use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Users must have an email address")]
    EmptyEmail,

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("Password too short: minimum {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Name too long: {len} characters (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {message}")]
    Hashing { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists(email: String) -> Self {
        Self::EmailAlreadyExists { email }
    }

    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Field the error is about, as a JSON pointer into the request body.
    pub fn pointer(&self) -> Option<&'static str> {
        match self {
            Self::EmptyEmail | Self::InvalidEmail { .. } | Self::EmailAlreadyExists { .. } => {
                Some("/email")
            }
            Self::PasswordTooShort { .. } => Some("/password"),
            Self::NameTooLong { .. } => Some("/name"),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::database(e.to_string())
    }
}
