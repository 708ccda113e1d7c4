//! Configuration model loaded from external sources.

use std::time::Duration;

use serde::Deserialize;

use crate::filter::DEFAULT_PAGE_SIZE;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Deserialize)]
/// Settings for talking to the audience backend.
pub struct AudienceConfig {
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub token: String,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl AudienceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl std::fmt::Debug for AudienceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudienceConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token", &"[REDACTED]")
            .field("brand_id", &self.brand_id)
            .field("agent_id", &self.agent_id)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
