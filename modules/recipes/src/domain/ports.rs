use async_trait::async_trait;

/// Where uploaded recipe images live.
///
/// Paths handed out by `save` are relative to the store root and are what the
/// database keeps; `url` turns one into the public address.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, bytes: Vec<u8>, extension: &str) -> anyhow::Result<String>;

    /// Missing files are not an error.
    async fn delete(&self, path: &str) -> anyhow::Result<()>;

    fn url(&self, path: &str) -> String;
}
