//! Handlers for the `user` command group.

use serde_json::json;
use tabled::{Table, Tabled};
use tracing::info;

use crate::adapter::inbound::cli::command::UserCommand;
use crate::adapter::inbound::cli::{output, require_user};
use crate::domain::{DomainError, User};
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::port::outbound::store::UserStore;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
}

pub async fn execute(services: &Services, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Create(args) => create(services, &args.fullname, &args.email).await,
        UserCommand::Show(args) => show(services, &args.id).await,
    }
}

/// Register a user. Emails are unique.
async fn create(services: &Services, fullname: &str, email: &str) -> Result<()> {
    let user = User::registered(fullname, email);
    if let Some(email) = &user.email {
        if services.store.user_by_email(email).await?.is_some() {
            return Err(DomainError::UserAlreadyExists.into());
        }
    }
    services.store.save_user(&user).await?;
    info!(user = %user.id, "User registered");

    if output::is_json() {
        output::json_output(json!({ "command": "user.create", "user": user }));
        return Ok(());
    }
    output::success(&format!("Created user {}", output::highlight(&user.id)));
    output::field("Name", &user.fullname);
    output::field("Email", user.email.as_deref().unwrap_or("-"));
    Ok(())
}

async fn show(services: &Services, id: &str) -> Result<()> {
    let user = require_user(services, id).await?;
    let groups = services.groups.groups_for_user(&user.id).await?;

    let mut rows = Vec::with_capacity(groups.len());
    for group in &groups {
        let roster = services.groups.roster(group).await?;
        let role = if roster.is_manager(&user.id) { "manager" } else { "member" };
        rows.push(GroupRow {
            id: group.id.to_string(),
            name: group.name.clone(),
            role: role.to_string(),
        });
    }

    if output::is_json() {
        let groups: Vec<_> = rows
            .iter()
            .map(|r| json!({ "id": r.id, "name": r.name, "role": r.role }))
            .collect();
        output::json_output(json!({ "command": "user.show", "user": user, "groups": groups }));
        return Ok(());
    }

    output::section(&user.fullname);
    output::field("Id", &user.id);
    output::field("Email", user.email.as_deref().unwrap_or("-"));
    output::field("Registered", user.is_registered);
    if user.is_disabled {
        output::warning("Account is disabled");
    }

    output::section("Groups");
    if rows.is_empty() {
        output::note("(none)");
    } else {
        output::lines(&Table::new(rows).to_string());
    }
    Ok(())
}
