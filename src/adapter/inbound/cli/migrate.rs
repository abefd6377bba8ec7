//! Handler for `migrate`.

use serde_json::json;

use crate::adapter::inbound::cli::command::MigrateArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::database::connection::{
    pending_migrations, revert_last_migration, run_migrations,
};
use crate::error::Result;
use crate::infrastructure::bootstrap::open_pool;
use crate::infrastructure::config::settings::Config;

/// Execute `migrate [--status | --revert]`.
pub fn execute(config: &Config, args: &MigrateArgs) -> Result<()> {
    let store_config = &config.database;
    let pool = open_pool(store_config)?;

    if args.status {
        let pending = pending_migrations(&pool)?;
        if output::is_json() {
            output::json_output(json!({
                "command": "migrate.status",
                "database": store_config.url,
                "pending": pending,
            }));
            return Ok(());
        }
        output::section("Migrations");
        output::field("Database", &store_config.url);
        if pending.is_empty() {
            output::success("Database is up to date");
        } else {
            for name in &pending {
                output::note(&format!("pending {name}"));
            }
        }
        return Ok(());
    }

    if args.revert {
        let version = revert_last_migration(&pool)?;
        if output::is_json() {
            output::json_output(json!({ "command": "migrate.revert", "reverted": version }));
        } else {
            output::success(&format!("Reverted migration {version}"));
        }
        return Ok(());
    }

    let applied = run_migrations(&pool)?;
    if output::is_json() {
        output::json_output(json!({ "command": "migrate", "applied": applied }));
        return Ok(());
    }
    if applied.is_empty() {
        output::success("Database is up to date");
    } else {
        for version in &applied {
            output::success(&format!("Applied {version}"));
        }
    }
    Ok(())
}
