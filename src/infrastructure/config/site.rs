//! Public API and website origins used to build absolute URLs.

use serde::{Deserialize, Serialize};

use crate::domain::SiteUrls;

/// `[api]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub domain: String,
    /// Version prefix, e.g. `v2/`.
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            domain: "http://localhost:8000/".into(),
            prefix: "v2/".into(),
        }
    }
}

/// `[web]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub domain: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            domain: "http://localhost:5000/".into(),
        }
    }
}

/// Combine both sections into the URL builder the domain uses.
#[must_use]
pub fn site_urls(api: &ApiConfig, web: &WebConfig) -> SiteUrls {
    SiteUrls {
        api_domain: api.domain.clone(),
        api_prefix: api.prefix.clone(),
        web_domain: web.domain.clone(),
    }
}
