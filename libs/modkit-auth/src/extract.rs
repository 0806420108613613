//! `AuthUser` extractor.
//!
//! Reads `Authorization: Bearer <jwt>` (or `Token <jwt>`), verifies it with the
//! `Arc<JwtKeys>` found in request extensions and yields the caller identity.
//! Any failure is a uniform 401 Problem.
//!
//! Verification is stateless: a token stays valid until its `exp` even if the
//! account is deactivated in the meantime. Deactivation takes effect at the
//! next `POST /users/token`, which refuses inactive users.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use modkit::{Problem, ProblemResponse};
use uuid::Uuid;

use crate::{AuthError, JwtKeys};

pub const UNAUTHENTICATED_CODE: &str = "AUTH_UNAUTHENTICATED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let raw = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = raw
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    let token = token.trim();
    if token.is_empty()
        || !(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token"))
    {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// The 401 Problem every authentication failure renders as.
pub fn unauthenticated(instance: &str) -> ProblemResponse {
    Problem::new(
        StatusCode::UNAUTHORIZED,
        "Unauthorized",
        "Authentication credentials were not provided or are invalid",
    )
    .with_type("https://errors.recipe-api.dev/AUTH_UNAUTHENTICATED")
    .with_code(UNAUTHENTICATED_CODE)
    .with_instance(instance)
    .into()
}

fn reject(err: &AuthError, instance: &str) -> ProblemResponse {
    tracing::debug!(error = %err, path = %instance, "rejecting unauthenticated request");
    unauthenticated(instance)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_owned();
        let Some(keys) = parts.extensions.get::<Arc<JwtKeys>>().cloned() else {
            tracing::error!("JwtKeys extension is not installed; every request is unauthenticated");
            return Err(reject(&AuthError::MissingCredentials, &instance));
        };

        let token = bearer_token(parts).map_err(|e| reject(&e, &instance))?;
        let claims = keys.verify(token).map_err(|e| reject(&e, &instance))?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
