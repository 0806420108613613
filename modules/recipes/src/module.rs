use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use sea_orm_migration::MigratorTrait;

use crate::api::rest::routes;
use crate::config::RecipesConfig;
use crate::contract::client::RecipesApi;
use crate::domain::{ports::ImageStore, service::Service};
use crate::gateways::local::RecipesLocalClient;
use crate::infra::{media::LocalImageStore, storage::migrations::Migrator};

struct State {
    service: Arc<Service>,
    media_root: PathBuf,
    config: RecipesConfig,
}

/// Recipes module: tags, ingredients, recipes and their images.
#[derive(Default)]
pub struct Recipes {
    state: ArcSwapOption<State>,
}

impl Recipes {
    fn state(&self) -> anyhow::Result<Arc<State>> {
        self.state
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("recipes service is not initialized"))
    }
}

/// Relative media dirs hang off the server home dir.
fn resolve_media_root(media_dir: &str, home_dir: Option<&std::path::Path>) -> PathBuf {
    let dir = PathBuf::from(media_dir);
    match home_dir {
        Some(home) if dir.is_relative() => home.join(dir),
        _ => dir,
    }
}

#[async_trait]
impl modkit::Module for Recipes {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> anyhow::Result<()> {
        let db = ctx.db_required()?;
        let config = ctx.module_config::<RecipesConfig>();

        let media_root = resolve_media_root(&config.media_dir, ctx.home_dir());
        tokio::fs::create_dir_all(&media_root).await.map_err(|e| {
            anyhow::anyhow!("cannot create media dir {}: {e}", media_root.display())
        })?;
        tracing::info!(
            media_root = %media_root.display(),
            media_url = %config.media_url,
            "recipes configured"
        );

        let images: Arc<dyn ImageStore> =
            Arc::new(LocalImageStore::new(media_root.clone(), config.media_url.clone()));
        let service = Arc::new(Service::new(db.sea(), images, config.clone().into()));

        let api: Arc<dyn RecipesApi> = Arc::new(RecipesLocalClient::new(service.clone()));
        ctx.client_hub().register::<dyn RecipesApi>(api);

        self.state.store(Some(Arc::new(State {
            service,
            media_root,
            config,
        })));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl modkit::DbModule for Recipes {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        tracing::info!("Running recipes migrations");
        Migrator::up(db.seaorm(), None).await?;
        Ok(())
    }
}

impl modkit::RestfulModule for Recipes {
    fn register_rest(
        &self,
        _ctx: &modkit::ModuleCtx,
        router: axum::Router,
    ) -> anyhow::Result<axum::Router> {
        let state = self.state()?;
        routes::register_routes(
            router,
            state.service.clone(),
            &state.media_root,
            &state.config.media_url,
            state.config.max_image_bytes,
        )
    }
}
