use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Provider of module-specific configuration (raw JSON sections only).
pub use runtime::ConfigProvider;

#[derive(Clone)]
pub struct ModuleCtx {
    pub(crate) db: Option<Arc<modkit_db::DbHandle>>,
    pub(crate) config_provider: Option<Arc<dyn ConfigProvider>>,
    pub(crate) client_hub: Arc<crate::client_hub::ClientHub>,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) module_name: Option<Arc<str>>,
    pub(crate) home_dir: Option<Arc<Path>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: ModuleCtx::from_token(token),
        }
    }
    pub fn with_db(mut self, db: Arc<modkit_db::DbHandle>) -> Self {
        self.inner.db = Some(db);
        self
    }
    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }
    pub fn with_client_hub(mut self, hub: Arc<crate::client_hub::ClientHub>) -> Self {
        self.inner.client_hub = hub;
        self
    }
    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.home_dir = Some(Arc::from(dir.into().as_path()));
        self
    }
    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    pub(crate) fn from_token(token: CancellationToken) -> Self {
        Self {
            db: None,
            config_provider: None,
            client_hub: Arc::new(crate::client_hub::ClientHub::default()),
            cancellation_token: token,
            module_name: None,
            home_dir: None,
        }
    }

    /// Scope context to a specific module name (used by the registry).
    pub fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    // ---- public read-only API for modules ----
    pub fn db(&self) -> Option<Arc<modkit_db::DbHandle>> {
        self.db.clone()
    }

    pub fn db_required(&self) -> anyhow::Result<Arc<modkit_db::DbHandle>> {
        self.db
            .clone()
            .ok_or_else(|| anyhow::anyhow!("database is required but not configured"))
    }

    pub fn client_hub(&self) -> Arc<crate::client_hub::ClientHub> {
        self.client_hub.clone()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Server home directory; relative paths in module configs are anchored here.
    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Best-effort: deserialize the module's config into `T`, fallback to `T::default()`
    /// if section is missing or invalid.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        match (&self.module_name, &self.config_provider) {
            (Some(name), Some(p)) => p
                .get_module_config(name)
                .and_then(|v| match serde_json::from_value::<T>(v.clone()) {
                    Ok(cfg) => Some(cfg),
                    Err(e) => {
                        tracing::warn!(module = %name, error = %e, "invalid module config, using defaults");
                        None
                    }
                })
                .unwrap_or_default(),
            _ => T::default(),
        }
    }

    /// Strict: deserialize the module's config into `T`, returning a pathful error on failure.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .module_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("context is not scoped to a module"))?;

        let prov = self
            .config_provider
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no ConfigProvider"))?;

        let val = prov
            .get_module_config(name)
            .ok_or_else(|| anyhow::anyhow!("missing module config: {name}"))?;

        let out: T = serde_json::from_value(val.clone())
            .map_err(|e| anyhow::anyhow!("invalid {name} config: {}", e))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    struct MapProvider(HashMap<String, serde_json::Value>);

    impl ConfigProvider for MapProvider {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            self.0.get(module_name)
        }
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct DemoCfg {
        #[serde(default)]
        limit: u32,
    }

    fn ctx_with(cfg: serde_json::Value) -> ModuleCtx {
        let mut m = HashMap::new();
        m.insert("demo".to_string(), cfg);
        ModuleCtxBuilder::new(CancellationToken::new())
            .with_config_provider(Arc::new(MapProvider(m)))
            .with_home_dir("/srv/app")
            .build()
            .for_module("demo")
    }

    #[test]
    fn typed_config_is_read_for_scoped_module() {
        let ctx = ctx_with(serde_json::json!({ "limit": 7 }));
        assert_eq!(ctx.current_module(), Some("demo"));
        assert_eq!(ctx.module_config::<DemoCfg>(), DemoCfg { limit: 7 });
        assert_eq!(ctx.module_config_required::<DemoCfg>().unwrap().limit, 7);
        assert_eq!(ctx.home_dir(), Some(Path::new("/srv/app")));
    }

    #[test]
    fn invalid_config_falls_back_to_default_but_strict_errors() {
        let ctx = ctx_with(serde_json::json!({ "limit": "many" }));
        assert_eq!(ctx.module_config::<DemoCfg>(), DemoCfg::default());
        let err = ctx.module_config_required::<DemoCfg>().unwrap_err();
        assert!(err.to_string().contains("invalid demo config"));
    }

    #[test]
    fn missing_db_is_reported() {
        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        assert!(ctx.db().is_none());
        assert!(ctx.db_required().is_err());
        assert!(ctx.home_dir().is_none());
    }
}
