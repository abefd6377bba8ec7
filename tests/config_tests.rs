use std::fs;
use std::path::PathBuf;

use osfcore::error::{ConfigError, Error};
use osfcore::infrastructure::config::logging::LogFormat;
use osfcore::infrastructure::config::settings::Config;
use tempfile::TempDir;

fn write_temp_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn full_config_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
[database]
url = "data/osf.db"
busy_timeout_ms = 250

[api]
domain = "https://api.test.osf.io/"
prefix = "v2/"

[web]
domain = "https://test.osf.io/"

[logging]
level = "warn,osfcore=debug"
format = "json"

[dataverse]
timeout_secs = 10
scheme = "http"
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.database.busy_timeout_ms, 250);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.dataverse.scheme, "http");
    let urls = config.site_urls();
    assert_eq!(urls.web("/abcde/"), "https://test.osf.io/abcde/");
    assert_eq!(
        urls.api_v2("/schemas/registrations/x/"),
        "https://api.test.osf.io/v2/schemas/registrations/x/"
    );
}

#[test]
fn config_rejects_bad_log_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "[logging]\nlevel = \"osfcore=loud\"\n");
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue { field: "logging.level", .. }))
    ));
}

#[test]
fn missing_file_is_a_read_error_but_load_or_default_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
    let config = Config::load_or_default(&path).unwrap();
    assert_eq!(config.api.prefix, "v2/");
}

#[test]
fn unknown_log_format_fails_to_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "[logging]\nformat = \"xml\"\n");
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}
