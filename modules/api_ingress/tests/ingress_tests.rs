use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use api_ingress::ApiIngress;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use modkit::{
    contracts::{RestHostModule, StatefulModule},
    ClientHub, ConfigProvider, Module, ModuleCtx, ModuleCtxBuilder,
};
use modkit_auth::{AuthUser, JwtKeys};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct StaticConfig(HashMap<String, Value>);

impl ConfigProvider for StaticConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&Value> {
        self.0.get(module_name)
    }
}

fn ctx(section: Value, hub: Arc<ClientHub>) -> ModuleCtx {
    let cfg = StaticConfig(HashMap::from([("api_ingress".to_string(), section)]));
    ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(cfg))
        .with_client_hub(hub)
        .build()
        .for_module("api_ingress")
}

async fn finalized_router(ingress: &ApiIngress, ctx: &ModuleCtx) -> Router {
    ingress.init(ctx).await.unwrap();
    let router = ingress.rest_prepare(ctx, Router::new()).unwrap();
    let router = router.route(
        "/whoami",
        get(|user: AuthUser| async move { user.email }),
    );
    ingress.rest_finalize(ctx, router).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_served_with_request_id() {
    let ingress = ApiIngress::default();
    let ctx = ctx(json!({}), Arc::new(ClientHub::default()));
    let app = finalized_router(&ingress, &ctx).await;

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("x-request-id").is_some());
    assert_eq!(json_body(resp).await["status"], "healthy");
}

#[tokio::test]
async fn unknown_route_is_problem_404() {
    let ingress = ApiIngress::default();
    let ctx = ctx(json!({}), Arc::new(ClientHub::default()));
    let app = finalized_router(&ingress, &ctx).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .header("x-request-id", "rid-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let body = json_body(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["instance"], "/nope");
    assert_eq!(body["request_id"], "rid-42");
}

#[tokio::test]
async fn jwt_keys_from_hub_reach_handlers() {
    let hub = Arc::new(ClientHub::default());
    let keys = Arc::new(JwtKeys::new(b"ingress-test", 60).unwrap());
    hub.register::<JwtKeys>(keys.clone());

    let ingress = ApiIngress::default();
    let ctx = ctx(json!({}), hub);
    let app = finalized_router(&ingress, &ctx).await;

    let token = keys.issue(uuid::Uuid::new_v4(), "me@example.com").unwrap();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn body_limit_from_config_is_enforced() {
    let ingress = ApiIngress::default();
    let ctx = ctx(json!({ "body_limit_bytes": 16 }), Arc::new(ClientHub::default()));
    ingress.init(&ctx).await.unwrap();
    let router = Router::new().route(
        "/echo",
        axum::routing::post(|body: String| async move { body }),
    );
    let app = ingress.rest_finalize(&ctx, router).unwrap();

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-length", "64")
                .body(Body::from("x".repeat(64)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn invalid_section_falls_back_to_defaults() {
    let ingress = ApiIngress::default();
    let ctx = ctx(json!({ "bind_addr": 42 }), Arc::new(ClientHub::default()));
    ingress.init(&ctx).await.unwrap();
    assert_eq!(ingress.get_config().bind_addr, "127.0.0.1:8087");
}

#[tokio::test]
async fn start_binds_and_stop_drains() {
    let ingress = ApiIngress::default();
    let ctx = ctx(json!({ "bind_addr": "127.0.0.1:0" }), Arc::new(ClientHub::default()));
    let _ = finalized_router(&ingress, &ctx).await;

    let cancel = CancellationToken::new();
    ingress.start(cancel.clone()).await.unwrap();
    let addr = ingress.bound_addr().expect("listener bound");
    assert_ne!(addr.port(), 0);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), ingress.stop(cancel))
        .await
        .expect("server stops after cancel")
        .unwrap();
}

#[tokio::test]
async fn bad_bind_addr_fails_start() {
    let ingress = ApiIngress::default();
    let ctx = ctx(json!({ "bind_addr": "not-an-addr" }), Arc::new(ClientHub::default()));
    ingress.init(&ctx).await.unwrap();

    let err = ingress.start(CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("Invalid bind address"));
}
