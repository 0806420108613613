use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user home directory")]
    NoHome,

    #[error("cannot determine the current working directory: {0}")]
    Cwd(#[source] std::io::Error),

    #[error("failed to create home directory '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the server home directory into an absolute path.
///
/// - `configured = Some(..)`: `~` is expanded, relative paths are anchored at the cwd.
/// - `configured = None`: platform default (`%APPDATA%/<subdir>` on Windows,
///   `$HOME/<subdir>` elsewhere).
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured {
        Some(raw) => absolutize(&expand_tilde(raw.trim())?)?,
        None => platform_base()?.join(default_subdir),
    };

    if create {
        std::fs::create_dir_all(&resolved).map_err(|source| HomeDirError::Create {
            path: resolved.to_string_lossy().to_string(),
            source,
        })?;
    }

    Ok(resolved)
}

fn platform_base() -> Result<PathBuf, HomeDirError> {
    #[cfg(target_os = "windows")]
    {
        dirs::config_dir().ok_or(HomeDirError::NoHome)
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().ok_or(HomeDirError::NoHome)
    }
}

fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return dirs::home_dir().ok_or(HomeDirError::NoHome);
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        let home = dirs::home_dir().ok_or(HomeDirError::NoHome)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}

fn absolutize(p: &Path) -> Result<PathBuf, HomeDirError> {
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(HomeDirError::Cwd)?;
    Ok(cwd.join(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested").join("home");

        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().to_string()), ".x", true).unwrap();

        assert_eq!(resolved, target);
        assert!(resolved.is_dir());
    }

    #[test]
    fn tilde_is_expanded() {
        let resolved = resolve_home_dir(Some("~/.recipe_tilde".into()), ".x", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(!resolved.to_string_lossy().starts_with('~'));
        assert!(resolved.ends_with(".recipe_tilde"));
    }

    #[test]
    fn relative_path_is_anchored_at_cwd() {
        let resolved = resolve_home_dir(Some("relative/home".into()), ".x", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("relative/home"));
    }
}
