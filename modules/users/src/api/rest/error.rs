use axum::{extract::rejection::JsonRejection, http::StatusCode};
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

pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> ProblemResponse {
    let p = match e {
        DomainError::UserNotFound { .. } => problem(
            StatusCode::NOT_FOUND,
            "User not found",
            "USERS_NOT_FOUND",
            e.to_string(),
            instance,
        ),
        DomainError::EmailAlreadyExists { .. } => problem(
            StatusCode::CONFLICT,
            "Email already registered",
            "USERS_EMAIL_CONFLICT",
            e.to_string(),
            instance,
        ),
        DomainError::InvalidCredentials => problem(
            StatusCode::BAD_REQUEST,
            "Invalid credentials",
            "USERS_INVALID_CREDENTIALS",
            e.to_string(),
            instance,
        ),
        DomainError::EmptyEmail
        | DomainError::InvalidEmail { .. }
        | DomainError::PasswordTooShort { .. }
        | DomainError::NameTooLong { .. } => {
            let p = problem(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                "USERS_VALIDATION",
                e.to_string(),
                instance,
            );
            match e.pointer() {
                Some(ptr) => p.with_errors(vec![ValidationError::new(ptr, e.to_string())]),
                None => p,
            }
        }
        DomainError::Hashing { .. } | DomainError::Database { .. } => {
            tracing::error!(error = %e, "users request failed");
            problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "USERS_INTERNAL",
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
        "USERS_VALIDATION",
        rej.body_text(),
        instance,
    )
    .into()
}
