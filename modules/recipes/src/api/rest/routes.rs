use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use tower_http::services::ServeDir;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Room for multipart framing around the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Mounts the catalog routes and serves `media_root` read-only under `media_url`.
pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    media_root: &Path,
    media_url: &str,
    max_image_bytes: usize,
) -> anyhow::Result<Router> {
    if !media_url.starts_with('/') || media_url.len() < 2 {
        anyhow::bail!("media_url must be an absolute path below '/', got '{media_url}'");
    }

    let catalog = Router::new()
        .route("/tags", get(handlers::list_tags).post(handlers::create_tag))
        .route(
            "/ingredients",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route(
            "/recipes",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/recipes/{id}",
            get(handlers::get_recipe)
                .patch(handlers::update_recipe)
                .put(handlers::replace_recipe)
                .delete(handlers::delete_recipe),
        )
        .route(
            "/recipes/{id}/upload-image",
            post(handlers::upload_image)
                .layer(DefaultBodyLimit::max(max_image_bytes + MULTIPART_OVERHEAD)),
        )
        .layer(Extension(service))
        .nest_service(media_url.trim_end_matches('/'), ServeDir::new(media_root));

    Ok(router.merge(catalog))
}
