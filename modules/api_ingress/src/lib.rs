//! HTTP host module.
//!
//! Owns the axum router every `RestfulModule` registers into, wraps it with the
//! global middleware stack and serves it until the runtime is cancelled.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use axum::{middleware::from_fn, routing::get, Extension, Router};
use modkit_auth::JwtKeys;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

const STOP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    auth: ArcSwapOption<JwtKeys>,
    // Finalized router from the REST phase, taken by `start`.
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<anyhow::Result<()>>>>,
    bound_addr: Mutex<Option<SocketAddr>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            auth: ArcSwapOption::empty(),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            bound_addr: Mutex::new(None),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Address the listener is bound to once `start` has run.
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.lock()
    }

    /// Wraps `router` with the fallback and the global middleware stack.
    ///
    /// Request order, outermost first:
    /// SetRequestId -> PropagateRequestId -> push_req_id_to_extensions -> Trace
    /// -> JwtKeys extension -> Timeout -> CORS -> BodyLimit -> handler
    pub fn apply_middleware(&self, router: Router) -> Router {
        let config = self.get_config();
        let x_request_id = request_id::header();

        let mut router = router
            .fallback(web::not_found)
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )));

        match self.auth.load_full() {
            Some(keys) => router = router.layer(Extension(keys)),
            None => tracing::warn!("no JwtKeys registered; authenticated routes will answer 401"),
        }

        router
            .layer(request_id::create_trace_layer())
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> anyhow::Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        tracing::debug!(bind_addr = %cfg.bind_addr, "api_ingress configured");
        self.config.store(Arc::new(cfg));

        match ctx.client_hub().get::<JwtKeys>() {
            Ok(keys) => self.auth.store(Some(keys)),
            Err(e) => tracing::warn!(error = %e, "JwtKeys not available in client hub"),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(
        &self,
        _ctx: &modkit::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router> {
        tracing::debug!("REST host prepared base router with health check");
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(&self, _ctx: &modkit::ModuleCtx, router: Router) -> anyhow::Result<Router> {
        let router = self.apply_middleware(router);
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("REST host finalized router");
        Ok(router)
    }
}

#[async_trait]
impl modkit::contracts::StatefulModule for ApiIngress {
    /// Binds the listener (bind errors fail startup) and serves in the background.
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let cfg = self.get_config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;

        let stored = { self.final_router.lock().take() };
        let router = match stored {
            Some(r) => r,
            None => {
                tracing::debug!("No router from REST phase, serving health check only");
                self.apply_middleware(Router::new().route("/health", get(web::health_check)))
            }
        };

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        *self.bound_addr.lock() = Some(local);
        tracing::info!("HTTP server bound on {}", local);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|e| anyhow::anyhow!(e))
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let handle = { self.server.lock().take() };
        let Some(handle) = handle else {
            return Ok(());
        };
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(joined) => joined.map_err(|e| anyhow::anyhow!("server task panicked: {e}"))?,
            Err(_) => {
                tracing::warn!("HTTP server did not stop within {:?}", STOP_TIMEOUT);
                Ok(())
            }
        }
    }
}
