use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use sea_orm_migration::MigratorTrait;

use crate::api::rest::routes;
use crate::config::UsersConfig;
use crate::contract::client::UsersApi;
use crate::domain::service::Service;
use crate::gateways::local::UsersLocalClient;
use crate::infra::storage::migrations::Migrator;

/// Users module: owns the `users` table and the `/users` routes.
#[derive(Default)]
pub struct Users {
    service: ArcSwapOption<Service>,
}

impl Users {
    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("users service is not initialized"))
    }
}

#[async_trait]
impl modkit::Module for Users {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> anyhow::Result<()> {
        let db = ctx.db_required()?;
        let cfg = ctx.module_config::<UsersConfig>();
        tracing::debug!(min_password_length = cfg.min_password_length, "users configured");

        let service = Arc::new(Service::new(db.sea(), cfg.into()));
        self.service.store(Some(service.clone()));

        let api: Arc<dyn UsersApi> = Arc::new(UsersLocalClient::new(service));
        ctx.client_hub().register::<dyn UsersApi>(api);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl modkit::DbModule for Users {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        tracing::info!("Running users migrations");
        Migrator::up(db.seaorm(), None).await?;
        Ok(())
    }
}

impl modkit::RestfulModule for Users {
    fn register_rest(
        &self,
        _ctx: &modkit::ModuleCtx,
        router: axum::Router,
    ) -> anyhow::Result<axum::Router> {
        routes::register_routes(router, self.service()?)
    }
}
