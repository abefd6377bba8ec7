//! Database connection settings.

use serde::{Deserialize, Serialize};

use super::paths;

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    pub url: String,
    /// How long a connection waits on a locked database.
    pub busy_timeout_ms: u32,
}

impl DatabaseConfig {
    /// Environment variable that overrides [`url`](Self::url).
    pub const URL_ENV: &'static str = "OSF_DATABASE_URL";

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.url == ":memory:"
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: paths::default_database().to_string_lossy().into_owned(),
            busy_timeout_ms: 5000,
        }
    }
}
