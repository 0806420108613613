use serde::{Deserialize, Serialize};

/// `modules.users` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsersConfig {
    pub min_password_length: usize,
    pub max_name_length: usize,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            min_password_length: 5,
            max_name_length: 255,
        }
    }
}
