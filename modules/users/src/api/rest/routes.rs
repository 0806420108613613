use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// `POST /users`, `POST /users/token`, `GET|PATCH /users/me`.
///
/// `/users/token` expects an `Arc<JwtKeys>` extension installed by the REST host.
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let users = Router::new()
        .route("/users", post(handlers::create_user))
        .route("/users/token", post(handlers::issue_token))
        .route(
            "/users/me",
            get(handlers::get_me).patch(handlers::update_me),
        )
        .layer(Extension(service));

    Ok(router.merge(users))
}
