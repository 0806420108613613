use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use modkit::Problem;
use serde_json::{json, Value};

use crate::request_id::XRequestId;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Router fallback: unknown routes answer with a 404 Problem.
pub async fn not_found(req: Request) -> impl IntoResponse {
    let path = req.uri().path().to_owned();
    let mut problem = Problem::new(
        StatusCode::NOT_FOUND,
        "Not Found",
        format!("No route for {} {}", req.method(), path),
    )
    .with_code("NOT_FOUND")
    .with_instance(path);
    if let Some(XRequestId(rid)) = req.extensions().get::<XRequestId>() {
        problem = problem.with_request_id(rid.clone());
    }
    modkit::ProblemResponse(problem)
}
