//! Local filesystem image store.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::ImageStore;

/// Sub-directory of the media root recipe images are written to.
pub const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";

/// Stores files under `<root>/uploads/recipe/<uuid>.<ext>` and serves them at `<url_prefix>/...`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute location of a stored relative path; rejects anything escaping the root.
    pub fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(path);
        if !rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("refusing media path outside the store root: {path}");
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, bytes: Vec<u8>, extension: &str) -> anyhow::Result<String> {
        let dir = self.root.join(RECIPE_UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating media dir {}", dir.display()))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let target = dir.join(&file_name);
        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("writing {}", target.display()))?;

        tracing::debug!(path = %target.display(), "stored recipe image");
        Ok(format!("{RECIPE_UPLOAD_DIR}/{file_name}"))
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", target.display())),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "/media/");

        let rel = store.save(b"bytes".to_vec(), "png").await.unwrap();
        assert!(rel.starts_with("uploads/recipe/"));
        assert!(rel.ends_with(".png"));
        assert!(dir.path().join(&rel).exists());
        assert_eq!(store.url(&rel), format!("/media/{rel}"));

        store.delete(&rel).await.unwrap();
        assert!(!dir.path().join(&rel).exists());
        // second delete is a no-op
        store.delete(&rel).await.unwrap();
    }

    #[test]
    fn traversal_is_refused() {
        let store = LocalImageStore::new("/srv/media", "/media");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert_eq!(
            store.resolve("uploads/recipe/a.png").unwrap(),
            PathBuf::from("/srv/media/uploads/recipe/a.png")
        );
    }
}
