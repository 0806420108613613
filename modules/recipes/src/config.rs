use serde::{Deserialize, Serialize};

/// `modules.recipes` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecipesConfig {
    /// Upload root; relative paths are anchored at the server home dir.
    pub media_dir: String,
    /// Public URL prefix the upload root is served under.
    pub media_url: String,
    pub max_image_bytes: usize,
    pub max_name_length: usize,
}

impl Default for RecipesConfig {
    fn default() -> Self {
        Self {
            media_dir: "media".to_string(),
            media_url: "/media".to_string(),
            max_image_bytes: 10 * 1024 * 1024,
            max_name_length: 255,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg: RecipesConfig =
            serde_json::from_value(serde_json::json!({ "media_dir": "/srv/media" })).unwrap();
        assert_eq!(cfg.media_dir, "/srv/media");
        assert_eq!(cfg.media_url, "/media");
        assert_eq!(cfg.max_name_length, 255);
    }
}
