//! Handler for the `config` command group.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Execute `config show`.
///
/// A missing file shows the built-in defaults.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": serde_json::to_value(&config)?,
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("Path", path.display());
    if !path.exists() {
        output::note("(file not found, showing defaults)");
    }

    output::section("Database");
    output::field("URL", &config.database.url);
    output::field("Busy timeout", format!("{}ms", config.database.busy_timeout_ms));

    output::section("Site");
    output::field("API", format!("{}{}", config.api.domain, config.api.prefix));
    output::field("Web", &config.web.domain);

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", format!("{:?}", config.logging.format).to_lowercase());

    output::section("Dataverse");
    output::field("Scheme", &config.dataverse.scheme);
    output::field("Timeout", format!("{}s", config.dataverse.timeout_secs));

    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    output::section("Config Validation");
    output::field("Path", path.display());
    let config = Config::load(path)?;
    output::success("Config file is valid");

    if config.database.is_memory() {
        output::warning("database.url is in-memory; data is lost when the command exits");
    }

    output::hint(&format!("osfcore config show -c {}", path.display()));
    Ok(())
}
