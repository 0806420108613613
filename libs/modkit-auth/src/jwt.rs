//! HS256 JSON Web Tokens.

use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::AuthError;

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub email: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Signing key plus token lifetime. Shared across handlers as `Arc<JwtKeys>`.
#[derive(Clone)]
pub struct JwtKeys {
    key: Hmac<Sha256>,
    ttl_secs: i64,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidKey("secret must not be empty".into()));
        }
        let key = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self {
            key,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    /// Random per-process key. Tokens do not survive a restart.
    pub fn ephemeral(ttl_secs: u64) -> Result<Self, AuthError> {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::new(&secret, ttl_secs)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(claims.sign_with_key(&self.key)?)
    }

    /// Checks the signature and the expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims: Claims = token.verify_with_key(&self.key)?;
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}
