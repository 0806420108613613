use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredentials,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    Expired,
    #[error("signing key rejected: {0}")]
    InvalidKey(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl From<jwt::Error> for AuthError {
    fn from(e: jwt::Error) -> Self {
        AuthError::InvalidToken(e.to_string())
    }
}
