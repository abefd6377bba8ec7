//! Path utilities for osfcore.
//!
//! All local data lives under `~/.osfcore/`:
//! - `~/.osfcore/config.toml` - main configuration
//! - `~/.osfcore/osfcore.db` - SQLite database

use std::path::PathBuf;

/// Returns the osfcore home directory (`~/.osfcore/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".osfcore")
}

/// Returns the default config file path (`~/.osfcore/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default database path (`~/.osfcore/osfcore.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("osfcore.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_osfcore_home() {
        assert!(home_dir().to_string_lossy().contains(".osfcore"));
        assert!(default_config().ends_with(".osfcore/config.toml"));
        assert!(default_database().ends_with(".osfcore/osfcore.db"));
    }
}
