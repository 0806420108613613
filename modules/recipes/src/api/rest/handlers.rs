use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, OriginalUri, Path, Query,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use modkit::ProblemResponse;
use modkit_auth::AuthUser;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::dto::{
    AssignedOnlyQuery, IngredientDto, NameReq, PatchRecipeReq, RecipeDetailDto, RecipeDto,
    RecipeImageDto, RecipeListQuery, RecipeReq, TagDto,
};
use crate::api::rest::error::{
    bad_upload_problem, domain_error_to_problem, json_rejection_to_problem, malformed_id_problem,
    query_rejection_to_problem,
};
use crate::domain::service::Service;

/// Multipart field carrying the uploaded file.
pub const IMAGE_FIELD: &str = "image";

fn parse_id(raw: &str, instance: &str) -> Result<Uuid, ProblemResponse> {
    Uuid::parse_str(raw).map_err(|_| malformed_id_problem(raw, instance))
}

// ---- tags ----

pub async fn list_tags(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    query: Result<Query<AssignedOnlyQuery>, QueryRejection>,
) -> Result<Json<Vec<TagDto>>, ProblemResponse> {
    let Query(query) = query.map_err(|e| query_rejection_to_problem(&e, uri.path()))?;
    let assigned_only = query
        .parse()
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    let tags = svc
        .list_tags(caller.user_id, assigned_only)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(tags.into_iter().map(TagDto::from).collect()))
}

pub async fn create_tag(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    body: Result<Json<NameReq>, JsonRejection>,
) -> Result<(StatusCode, Json<TagDto>), ProblemResponse> {
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;

    match svc.create_tag(caller.user_id, req.into()).await {
        Ok(tag) => Ok((StatusCode::CREATED, Json(TagDto::from(tag)))),
        Err(e) => {
            info!("Rejected tag for user {}: {}", caller.user_id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}

// ---- ingredients ----

pub async fn list_ingredients(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    query: Result<Query<AssignedOnlyQuery>, QueryRejection>,
) -> Result<Json<Vec<IngredientDto>>, ProblemResponse> {
    let Query(query) = query.map_err(|e| query_rejection_to_problem(&e, uri.path()))?;
    let assigned_only = query
        .parse()
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    let ingredients = svc
        .list_ingredients(caller.user_id, assigned_only)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(
        ingredients.into_iter().map(IngredientDto::from).collect(),
    ))
}

pub async fn create_ingredient(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    body: Result<Json<NameReq>, JsonRejection>,
) -> Result<(StatusCode, Json<IngredientDto>), ProblemResponse> {
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;

    match svc.create_ingredient(caller.user_id, req.into()).await {
        Ok(ingredient) => Ok((StatusCode::CREATED, Json(IngredientDto::from(ingredient)))),
        Err(e) => {
            info!("Rejected ingredient for user {}: {}", caller.user_id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}

// ---- recipes ----

pub async fn list_recipes(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    query: Result<Query<RecipeListQuery>, QueryRejection>,
) -> Result<Json<Vec<RecipeDto>>, ProblemResponse> {
    let Query(query) = query.map_err(|e| query_rejection_to_problem(&e, uri.path()))?;
    let filter = query
        .parse()
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    let recipes = svc
        .list_recipes(caller.user_id, filter)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(recipes.into_iter().map(RecipeDto::from).collect()))
}

pub async fn create_recipe(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    body: Result<Json<RecipeReq>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeDto>), ProblemResponse> {
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;
    info!(user_id = %caller.user_id, title = %req.title, "Creating recipe");

    match svc.create_recipe(caller.user_id, req.into()).await {
        Ok(recipe) => Ok((StatusCode::CREATED, Json(RecipeDto::from(recipe)))),
        Err(e) => {
            info!("Rejected recipe for user {}: {}", caller.user_id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}

pub async fn get_recipe(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<RecipeDetailDto>, ProblemResponse> {
    let id = parse_id(&raw_id, uri.path())?;
    let recipe = svc
        .get_recipe(caller.user_id, id)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(RecipeDetailDto::from(recipe)))
}

pub async fn update_recipe(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    Path(raw_id): Path<String>,
    body: Result<Json<PatchRecipeReq>, JsonRejection>,
) -> Result<Json<RecipeDto>, ProblemResponse> {
    let id = parse_id(&raw_id, uri.path())?;
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;

    match svc.update_recipe(caller.user_id, id, req.into()).await {
        Ok(recipe) => Ok(Json(RecipeDto::from(recipe))),
        Err(e) => {
            info!("Failed to update recipe {}: {}", id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}

pub async fn replace_recipe(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    Path(raw_id): Path<String>,
    body: Result<Json<RecipeReq>, JsonRejection>,
) -> Result<Json<RecipeDto>, ProblemResponse> {
    let id = parse_id(&raw_id, uri.path())?;
    let Json(req) = body.map_err(|e| json_rejection_to_problem(&e, uri.path()))?;

    match svc.replace_recipe(caller.user_id, id, req.into()).await {
        Ok(recipe) => Ok(Json(RecipeDto::from(recipe))),
        Err(e) => {
            info!("Failed to replace recipe {}: {}", id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}

pub async fn delete_recipe(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ProblemResponse> {
    let id = parse_id(&raw_id, uri.path())?;
    svc.delete_recipe(caller.user_id, id)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_image(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    caller: AuthUser,
    Path(raw_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RecipeImageDto>, ProblemResponse> {
    let id = parse_id(&raw_id, uri.path())?;
    // Foreign recipes answer 404 before any payload is inspected.
    svc.get_recipe(caller.user_id, id)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    let mut multipart = multipart.map_err(|e| bad_upload_problem(e.body_text(), uri.path()))?;
    let bytes = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| bad_upload_problem(e.body_text(), uri.path()))?;
        let Some(field) = field else {
            return Err(bad_upload_problem("No file was submitted.", uri.path()));
        };
        if field.name() == Some(IMAGE_FIELD) {
            break field
                .bytes()
                .await
                .map_err(|e| bad_upload_problem(e.body_text(), uri.path()))?;
        }
    };

    match svc.upload_image(caller.user_id, id, bytes.to_vec()).await {
        Ok(recipe) => Ok(Json(RecipeImageDto::from(recipe))),
        Err(e) => {
            info!("Image upload for recipe {} rejected: {}", id, e);
            Err(domain_error_to_problem(&e, uri.path()))
        }
    }
}
