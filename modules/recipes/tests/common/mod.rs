#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Extension, Router,
};
use modkit_auth::JwtKeys;
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use recipes::{
    domain::{
        ports::ImageStore,
        service::{Service, ServiceConfig},
    },
    infra::{media::LocalImageStore, storage::migrations::Migrator},
};

pub struct TestApp {
    pub router: Router,
    pub service: Arc<Service>,
    pub keys: Arc<JwtKeys>,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = modkit_db::DbHandle::connect("sqlite::memory:", modkit_db::ConnectOpts::default())
            .await
            .expect("Failed to connect to test database");
        Migrator::up(db.seaorm(), None)
            .await
            .expect("Failed to run migrations");

        let media = tempfile::tempdir().expect("tempdir");
        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(media.path(), "/media"));
        let service = Arc::new(Service::new(db.sea(), images, ServiceConfig::default()));
        let keys = Arc::new(JwtKeys::new(b"recipes-test-secret", 3600).unwrap());

        let router = recipes::api::rest::routes::register_routes(
            Router::new(),
            service.clone(),
            media.path(),
            "/media",
            ServiceConfig::default().max_image_bytes,
        )
        .expect("Failed to register routes")
        .layer(Extension(keys.clone()));

        Self {
            router,
            service,
            keys,
            media,
        }
    }

    /// Bearer header value for a fresh user id.
    pub fn login(&self) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let token = self.keys.issue(id, &format!("{id}@example.com")).unwrap();
        (id, format!("Bearer {token}"))
    }

    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(req).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, auth, None)).await
    }

    pub async fn post(&self, uri: &str, auth: &str, body: Value) -> (StatusCode, Value) {
        self.send(request("POST", uri, Some(auth), Some(body))).await
    }

    pub async fn patch(&self, uri: &str, auth: &str, body: Value) -> (StatusCode, Value) {
        self.send(request("PATCH", uri, Some(auth), Some(body))).await
    }

    pub async fn put(&self, uri: &str, auth: &str, body: Value) -> (StatusCode, Value) {
        self.send(request("PUT", uri, Some(auth), Some(body))).await
    }

    pub async fn delete(&self, uri: &str, auth: &str) -> (StatusCode, Value) {
        self.send(request("DELETE", uri, Some(auth), None)).await
    }

    /// Creates a tag and returns its id.
    pub async fn tag(&self, auth: &str, name: &str) -> String {
        let (status, body) = self
            .post("/tags", auth, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn ingredient(&self, auth: &str, name: &str) -> String {
        let (status, body) = self
            .post("/ingredients", auth, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a sample recipe with `extra` merged over the defaults.
    pub async fn recipe(&self, auth: &str, extra: Value) -> Value {
        let mut payload = serde_json::json!({
            "title": "Sample recipe",
            "time_in_minutes": 10,
            "price": "5.00",
        });
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let (status, body) = self.post("/recipes", auth, payload).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        b = b.header("authorization", auth);
    }
    match body {
        Some(v) => b
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => b.body(Body::empty()).unwrap(),
    }
}

pub const BOUNDARY: &str = "recipe-test-boundary";

/// One-field multipart body.
pub fn multipart_request(
    uri: &str,
    auth: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.jpg\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", auth)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(10, 10, image::Rgb([40, 120, 200]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
