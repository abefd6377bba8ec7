//! Handlers for the `dataverse` command group.

use serde_json::{json, Value};

use crate::adapter::inbound::cli::command::DataverseCommand;
use crate::adapter::inbound::cli::{output, require_node, require_user};
use crate::domain::AccountId;
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;

pub async fn execute(services: &Services, command: DataverseCommand) -> Result<()> {
    let addon = &services.dataverse;
    match command {
        DataverseCommand::Connect(args) => {
            let user = require_user(services, &args.user).await?;
            let account = addon.connect_account(&user, &args.host, &args.token).await?;
            if output::is_json() {
                output::json_output(json!({ "command": "dataverse.connect", "account": account }));
            } else {
                output::success(&format!("Connected {}", account.oauth_key));
                output::field("Account", &account.id);
                output::hint(&format!(
                    "osfcore dataverse authorize <node> {} {}",
                    user.id, account.id
                ));
            }
            Ok(())
        }
        DataverseCommand::Authorize(args) => {
            let node = require_node(services, &args.node).await?;
            let user = require_user(services, &args.user).await?;
            let result = addon
                .add_user_auth(&node, &user, &AccountId::new(args.account))
                .await?;
            print_settings("dataverse.authorize", &result, "Project authorized");
            Ok(())
        }
        DataverseCommand::Deauthorize(args) => {
            let node = require_node(services, &args.node).await?;
            let user = require_user(services, &args.user).await?;
            let result = addon.remove_user_auth(&node, &user).await?;
            print_settings("dataverse.deauthorize", &result, "Project deauthorized");
            Ok(())
        }
        DataverseCommand::Dataset(args) => {
            let node = require_node(services, &args.node).await?;
            let settings = addon
                .set_dataset(&node, &args.alias, &args.dataverse, &args.doi, &args.title)
                .await?;
            if output::is_json() {
                output::json_output(json!({ "command": "dataverse.dataset", "settings": settings }));
            } else {
                output::success(&format!("Selected dataset {}", args.doi));
                if !settings.has_auth() {
                    output::warning("Project is not authorized yet");
                }
            }
            Ok(())
        }
        DataverseCommand::Show(args) => {
            let node = require_node(services, &args.node).await?;
            let user = require_user(services, &args.user).await?;
            let settings = addon.node_settings(&node).await?;
            let user_settings = addon.user_settings(&user.id).await?;
            let result = json!({ "result": settings.serialize(&user.id, user_settings.as_ref()) });
            print_settings("dataverse.show", &result, &node.title);
            Ok(())
        }
    }
}

/// Print a `{"result": ...}` settings document.
fn print_settings(command: &str, result: &Value, title: &str) {
    if output::is_json() {
        output::json_output(json!({ "command": command, "settings": result["result"] }));
        return;
    }

    output::section(title);
    if let Some(fields) = result["result"].as_object() {
        for (key, value) in fields {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            output::field(key, value);
        }
    }
}
