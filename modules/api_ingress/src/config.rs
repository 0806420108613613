use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    pub cors_enabled: bool,
    /// Handler timeout; the request is answered with 408 when exceeded.
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_string(),
            cors_enabled: false,
            request_timeout_secs: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}
