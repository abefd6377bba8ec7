use anyhow::Context;
use clap::Parser;

use osfcore::adapter::inbound::cli::command::{Cli, Commands};
use osfcore::adapter::inbound::cli::{output, run};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let context = match &cli.command {
        Commands::Migrate(_) => "migration failed",
        Commands::Config(_) => "configuration check failed",
        Commands::User(_) => "user command failed",
        Commands::Node(_) => "node command failed",
        Commands::Schema(_) => "schema command failed",
        Commands::Group(_) => "group command failed",
        Commands::Dataverse(_) => "dataverse command failed",
    };

    if let Err(e) = run(cli).await.context(context) {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
