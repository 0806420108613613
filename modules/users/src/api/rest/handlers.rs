use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri},
    http::StatusCode,
    response::Json,
    Extension,
};
use modkit::ProblemResponse;
use modkit_auth::{extract, AuthUser, JwtKeys};
use tracing::{error, info};

use crate::api::rest::dto::{CreateUserReq, TokenDto, TokenReq, UpdateUserReq, UserDto};
use crate::api::rest::error::{domain_error_to_problem, json_rejection_to_problem};
use crate::domain::{error::DomainError, service::Service};

pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;
    info!(email = %req.email, "Creating user");

    match svc.create_user(req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}

pub async fn issue_token(
    Extension(svc): Extension<Arc<Service>>,
    Extension(keys): Extension<Arc<JwtKeys>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<TokenReq>, JsonRejection>,
) -> Result<Json<TokenDto>, ProblemResponse> {
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;

    let user = svc
        .authenticate(&req.email, &req.password)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    let token = keys.issue(user.id, &user.email).map_err(|e| {
        error!("Failed to sign token: {}", e);
        ProblemResponse::from(
            modkit::internal_error("An internal error occurred")
                .0
                .with_code("USERS_INTERNAL")
                .with_instance(uri.path()),
        )
    })?;
    info!(user_id = %user.id, "Issued token");
    Ok(Json(TokenDto { token }))
}

pub async fn get_me(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
) -> Result<Json<UserDto>, ProblemResponse> {
    match svc.get_user(caller.user_id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        // A valid token for a vanished account is treated as no credentials.
        Err(DomainError::UserNotFound { .. }) => Err(extract::unauthenticated(uri.path())),
        Err(e) => Err(domain_error_to_problem(&e, uri.path())),
    }
}

pub async fn update_me(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;
    info!(user_id = %caller.user_id, "Updating own profile");

    match svc.update_user(caller.user_id, req.into()).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", caller.user_id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}
