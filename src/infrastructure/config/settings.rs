//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; `OSF_DATABASE_URL` overrides
//! the database location so deployments can keep the file generic.
//!
//! # Example
//!
//! ```no_run
//! use osfcore::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use super::database::DatabaseConfig;
use super::dataverse::DataverseConfig;
use super::logging::LoggingConfig;
use super::site::{site_urls, ApiConfig, WebConfig};
use crate::domain::SiteUrls;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Every section is optional in the file and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
    pub dataverse: DataverseConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_database_override(std::env::var(DatabaseConfig::URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error for an unreadable or invalid file.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse_toml("")
        }
    }

    /// Replace the database URL when `url` is set and non-empty.
    pub fn apply_database_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.database.url = url;
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.url",
            }
            .into());
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.busy_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        for (field, domain) in [("api.domain", &self.api.domain), ("web.domain", &self.web.domain)] {
            let parsed = url::Url::parse(domain).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be an http(s) URL".to_string(),
                }
                .into());
            }
        }

        if EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: format!("invalid filter directive '{}'", self.logging.level),
            }
            .into());
        }

        if self.dataverse.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dataverse.timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !matches!(self.dataverse.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "dataverse.scheme",
                reason: "must be http or https".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// URL builder for the configured API and website.
    #[must_use]
    pub fn site_urls(&self) -> SiteUrls {
        site_urls(&self.api, &self.web)
    }

    /// Render the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Other`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Other(e.to_string()).into())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::infrastructure::config::logging::LogFormat;

    fn parse(content: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_database_override(None);
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert!(config.database.url.ends_with("osfcore.db"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.dataverse.scheme, "https");
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            r#"
            [database]
            url = ":memory:"

            [api]
            domain = "https://api.osf.io/"
            prefix = "v2/"

            [web]
            domain = "https://osf.io/"

            [logging]
            level = "osfcore=debug"
            format = "json"

            [dataverse]
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert!(config.database.is_memory());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.dataverse.timeout().as_secs(), 5);
        assert_eq!(
            config.site_urls().api_v2("/groups/abcde/"),
            "https://api.osf.io/v2/groups/abcde/"
        );
    }

    #[test]
    fn override_replaces_database_url() {
        let mut config = Config::default();
        config.apply_database_override(Some("/tmp/other.db".into()));
        assert_eq!(config.database.url, "/tmp/other.db");
        config.apply_database_override(Some("  ".into()));
        assert_eq!(config.database.url, "/tmp/other.db");
    }

    #[test]
    fn invalid_values_are_reported_by_field() {
        let err = parse("[database]\nbusy_timeout_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "database.busy_timeout_ms", .. })
        ));

        let err = parse("[api]\ndomain = \"not a url\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "api.domain", .. })
        ));

        let err = parse("[dataverse]\nscheme = \"ftp\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "dataverse.scheme", .. })
        ));

        let err = parse("[database]\nurl = \"\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "database.url" })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            parse("[database"),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn rendered_toml_parses_back() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(parse(&rendered).unwrap(), config);
    }
}
