use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
};
use modkit::{Problem, ProblemResponse, ValidationError};

use crate::domain::error::DomainError;

const TYPE_BASE: &str = "https://errors.recipe-api.dev/";

fn problem(status: StatusCode, title: &str, code: &str, detail: String, instance: &str) -> Problem {
    Problem::new(status, title, detail)
        .with_type(format!("{TYPE_BASE}{code}"))
        .with_code(code)
        .with_instance(instance)
        .with_current_trace_id()
}

fn with_pointer(p: Problem, e: &DomainError) -> Problem {
    match e.pointer() {
        Some(ptr) => p.with_errors(vec![ValidationError::new(ptr, e.to_string())]),
        None => p,
    }
}

pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> ProblemResponse {
    let p = match e {
        DomainError::RecipeNotFound { .. } => problem(
            StatusCode::NOT_FOUND,
            "Recipe not found",
            "RECIPES_NOT_FOUND",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { .. }
        | DomainError::UnknownTags { .. }
        | DomainError::UnknownIngredients { .. } => with_pointer(
            problem(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                "RECIPES_VALIDATION",
                e.to_string(),
                instance,
            ),
            e,
        ),
        DomainError::InvalidImage { .. } | DomainError::ImageTooLarge { .. } => with_pointer(
            problem(
                StatusCode::BAD_REQUEST,
                "Invalid image",
                "RECIPES_INVALID_IMAGE",
                e.to_string(),
                instance,
            ),
            e,
        ),
        DomainError::Storage { .. } | DomainError::Database { .. } => {
            tracing::error!(error = %e, "recipes request failed");
            problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "RECIPES_INTERNAL",
                "An internal error occurred".to_string(),
                instance,
            )
        }
    };
    p.into()
}

pub fn json_rejection_to_problem(rej: &JsonRejection, instance: &str) -> ProblemResponse {
    problem(
        StatusCode::BAD_REQUEST,
        "Invalid request body",
        "RECIPES_VALIDATION",
        rej.body_text(),
        instance,
    )
    .into()
}

pub fn query_rejection_to_problem(rej: &QueryRejection, instance: &str) -> ProblemResponse {
    problem(
        StatusCode::BAD_REQUEST,
        "Invalid query string",
        "RECIPES_VALIDATION",
        rej.body_text(),
        instance,
    )
    .into()
}

/// Unparseable path ids cannot name an existing recipe.
pub fn malformed_id_problem(raw: &str, instance: &str) -> ProblemResponse {
    problem(
        StatusCode::NOT_FOUND,
        "Recipe not found",
        "RECIPES_NOT_FOUND",
        format!("Recipe not found: {raw}"),
        instance,
    )
    .into()
}

/// Multipart framing errors and missing fields.
pub fn bad_upload_problem(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    let detail = detail.into();
    problem(
        StatusCode::BAD_REQUEST,
        "Invalid image",
        "RECIPES_INVALID_IMAGE",
        detail.clone(),
        instance,
    )
    .with_errors(vec![ValidationError::new("/image", detail)])
    .into()
}
