//! CLI module graph and command dispatch.

pub mod command;
pub mod config;
pub mod dataverse;
pub mod group;
pub mod migrate;
pub mod node;
pub mod output;
pub mod schema;
pub mod user;

use std::path::Path;

use crate::domain::{Node, NodeId, User, UserId};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::{build_services, Services};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::store::{NodeStore, UserStore};

use self::command::{Cli, Commands, ConfigCommand};

/// Run the parsed command line.
///
/// # Errors
///
/// Returns the first error raised by the selected command.
pub async fn run(cli: Cli) -> Result<()> {
    cli.color.apply();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match cli.command {
        Commands::Config(ConfigCommand::Show) => config::execute_show(&cli.config),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&cli.config),
        Commands::Migrate(args) => {
            let config = load_config(&cli.config, cli.verbose)?;
            migrate::execute(&config, &args)
        }
        Commands::User(command) => user::execute(&services(&cli.config, cli.verbose)?, command).await,
        Commands::Node(command) => node::execute(&services(&cli.config, cli.verbose)?, command).await,
        Commands::Schema(command) => {
            schema::execute(&services(&cli.config, cli.verbose)?, command).await
        }
        Commands::Group(command) => {
            group::execute(&services(&cli.config, cli.verbose)?, command).await
        }
        Commands::Dataverse(command) => {
            dataverse::execute(&services(&cli.config, cli.verbose)?, command).await
        }
    }
}

/// Load the config file (defaults when absent) and start logging.
///
/// Each `-v` raises the crate's log level one step above the configured one.
fn load_config(path: &Path, verbose: u8) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    match verbose {
        0 => {}
        1 => config.logging.level = "osfcore=debug".into(),
        _ => config.logging.level = "osfcore=trace".into(),
    }
    config.init_logging();
    Ok(config)
}

fn services(path: &Path, verbose: u8) -> Result<Services> {
    build_services(&load_config(path, verbose)?)
}

/// Look up a user by id.
pub(crate) async fn require_user(services: &Services, id: &str) -> Result<User> {
    services
        .store
        .user(&UserId::new(id))
        .await?
        .ok_or_else(|| Error::not_found("user", id))
}

/// Look up the acting user named by a `--by` flag; `None` acts as the system.
pub(crate) async fn acting_user(services: &Services, id: Option<&str>) -> Result<Option<User>> {
    match id {
        Some(id) => require_user(services, id).await.map(Some),
        None => Ok(None),
    }
}

/// Look up a node by id.
pub(crate) async fn require_node(services: &Services, id: &str) -> Result<Node> {
    services
        .store
        .node(&NodeId::new(id))
        .await?
        .ok_or_else(|| Error::not_found("node", id))
}
