//! Type-safe hub of in-process clients.
//!
//! Providers register an implementation once under its interface type
//! (`register::<dyn my::Api>(..)`), consumers fetch it back by the same type.
//! Re-registering overwrites; Arcs already held by consumers remain valid.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Stable type key for trait objects: fully-qualified `type_name::<T>()`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not found: type={type_key:?}")]
    NotFound { type_key: TypeKey },

    #[error("type mismatch in hub for type={type_key:?}")]
    TypeMismatch { type_key: TypeKey },
}

type Boxed = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<TypeKey, Boxed>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under the interface type `T` (usually `dyn SomeApi`).
    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.write().insert(TypeKey::of::<T>(), Box::new(client));
    }

    /// Fetch a client by interface type `T`.
    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let r = self.map.read();
        let boxed = r.get(&type_key).ok_or_else(|| ClientHubError::NotFound {
            type_key: type_key.clone(),
        })?;

        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ClientHubError::TypeMismatch { type_key })
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_trait::async_trait]
    trait TestApi: Send + Sync {
        async fn id(&self) -> usize;
    }

    struct ImplA(usize);

    #[async_trait::async_trait]
    impl TestApi for ImplA {
        async fn id(&self) -> usize {
            self.0
        }
    }

    #[tokio::test]
    async fn register_and_get_dyn_trait() {
        let hub = ClientHub::new();
        let api: Arc<dyn TestApi> = Arc::new(ImplA(7));
        hub.register::<dyn TestApi>(api.clone());

        let got = hub.get::<dyn TestApi>().unwrap();
        assert_eq!(got.id().await, 7);
        assert!(Arc::ptr_eq(&api, &got));
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn re_register_overwrites() {
        let hub = ClientHub::new();
        hub.register::<dyn TestApi>(Arc::new(ImplA(1)));
        hub.register::<dyn TestApi>(Arc::new(ImplA(2)));
        assert_eq!(hub.get::<dyn TestApi>().unwrap().id().await, 2);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn missing_client_is_not_found() {
        let hub = ClientHub::new();
        assert!(hub.is_empty());
        assert!(matches!(
            hub.get::<dyn TestApi>(),
            Err(ClientHubError::NotFound { .. })
        ));
    }
}
