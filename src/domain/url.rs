//! Absolute URL construction for API and web resources.

use serde::{Deserialize, Serialize};

/// Where the API and the website are served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteUrls {
    /// API origin, e.g. `https://api.osf.io/`.
    pub api_domain: String,
    /// Version prefix appended to the API origin, e.g. `v2/`.
    pub api_prefix: String,
    /// Website origin, e.g. `https://osf.io/`.
    pub web_domain: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self {
            api_domain: "https://api.osf.io/".into(),
            api_prefix: "v2/".into(),
            web_domain: "https://osf.io/".into(),
        }
    }
}

impl SiteUrls {
    /// Absolute API v2 URL for a resource path like `/groups/abc/`.
    #[must_use]
    pub fn api_v2(&self, path: &str) -> String {
        let base = join(&self.api_domain, &self.api_prefix);
        join(&base, path)
    }

    /// Absolute website URL for a site-relative path.
    #[must_use]
    pub fn web(&self, path: &str) -> String {
        join(&self.web_domain, path)
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
