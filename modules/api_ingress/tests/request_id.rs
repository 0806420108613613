use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware::from_fn,
    response::Json,
    routing::get,
    Router,
};
use modkit::{Problem, ProblemResponse};
use serde_json::json;
use tower::util::ServiceExt;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use api_ingress::request_id::{header as request_id_header, MakeReqId, XRequestId};

fn test_app() -> Router {
    let x_request_id = request_id_header();

    Router::new()
        .route("/ok", get(ok_handler))
        .route("/fail", get(failing_handler))
        .layer(from_fn(api_ingress::request_id::push_req_id_to_extensions))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}

async fn ok_handler(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<serde_json::Value> {
    Json(json!({ "request_id": request_id }))
}

async fn failing_handler(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> ProblemResponse {
    Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", "boom")
        .with_code("TEST_FAILURE")
        .with_request_id(request_id)
        .into()
}

#[tokio::test]
async fn generated_id_matches_extension_and_header() {
    let response = test_app()
        .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert!(!header.is_empty());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["request_id"], header);
}

#[tokio::test]
async fn incoming_id_is_preserved() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/ok")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
}

#[tokio::test]
async fn problem_carries_request_id() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/fail")
                .header("x-request-id", "error-test-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("error-test-123")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "TEST_FAILURE");
    assert_eq!(json["request_id"], "error-test-123");
}
