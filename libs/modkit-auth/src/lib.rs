//! Authentication primitives shared by the server modules.
//!
//! * [`JwtKeys`] issues and verifies HS256 bearer tokens.
//! * [`password`] hashes and checks passwords with argon2.
//! * [`AuthUser`] is the axum extractor that gates handlers behind a valid token.

mod error;
pub mod extract;
pub mod jwt;
pub mod password;

pub use error::AuthError;
pub use extract::AuthUser;
pub use jwt::{Claims, JwtKeys};
