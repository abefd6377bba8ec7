//! Dataverse API client settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `[dataverse]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataverseConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// URL scheme for installations; `http` only for local test servers.
    pub scheme: String,
}

impl DataverseConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DataverseConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            scheme: "https".into(),
        }
    }
}
