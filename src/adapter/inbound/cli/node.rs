//! Handlers for the `node` command group.

use serde_json::json;
use tabled::{Table, Tabled};
use tracing::info;

use crate::adapter::inbound::cli::command::NodeCommand;
use crate::adapter::inbound::cli::{output, require_node};
use crate::domain::Node;
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::port::outbound::store::NodeStore;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "When")]
    created: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "User")]
    user: String,
}

pub async fn execute(services: &Services, command: NodeCommand) -> Result<()> {
    match command {
        NodeCommand::Create(args) => create(services, &args.title, args.parent.as_deref()).await,
        NodeCommand::Show(args) => show(services, &args.id).await,
    }
}

async fn create(services: &Services, title: &str, parent: Option<&str>) -> Result<()> {
    let node = match parent {
        Some(parent) => {
            let parent = require_node(services, parent).await?;
            Node::component(title, &parent.id)
        }
        None => Node::new(title),
    };
    services.store.save_node(&node).await?;
    info!(node = %node.id, category = %node.category, "Node created");

    if output::is_json() {
        output::json_output(json!({ "command": "node.create", "node": node }));
        return Ok(());
    }
    output::success(&format!(
        "Created {} {}",
        node.project_or_component(),
        output::highlight(&node.id)
    ));
    output::field("Title", &node.title);
    Ok(())
}

async fn show(services: &Services, id: &str) -> Result<()> {
    let node = require_node(services, id).await?;
    let logs = services.store.node_logs(&node.id).await?;

    if output::is_json() {
        output::json_output(json!({ "command": "node.show", "node": node, "logs": logs }));
        return Ok(());
    }

    output::section(&node.title);
    output::field("Id", &node.id);
    output::field("Category", node.category_display());
    output::field("URL", services.urls.web(&node.settings_url()));
    if let Some(parent) = &node.parent_id {
        output::field("Parent", parent);
    }

    output::section("Log");
    if logs.is_empty() {
        output::note("(empty)");
        return Ok(());
    }
    let rows: Vec<LogRow> = logs
        .iter()
        .map(|log| LogRow {
            created: log.created.format("%Y-%m-%d %H:%M").to_string(),
            action: log.action.clone(),
            user: log
                .user_id
                .as_ref()
                .map_or_else(|| "system".to_string(), ToString::to_string),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
