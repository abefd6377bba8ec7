//! Handlers for the `group` command group.
//!
//! Every mutating command takes the acting user from `--by`. Without it the
//! change runs as a system action, which skips the manager check.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::GroupCommand;
use crate::adapter::inbound::cli::{acting_user, output, require_node, require_user};
use crate::domain::{GroupId, GroupRole, Permission};
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "User")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: &'static str,
    #[tabled(rename = "Registered")]
    registered: bool,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Permission")]
    permission: &'static str,
}

pub async fn execute(services: &Services, command: GroupCommand) -> Result<()> {
    match command {
        GroupCommand::Create(args) => {
            let creator = require_user(services, &args.creator).await?;
            let group = services.groups.create(&args.name, &creator).await?;
            if output::is_json() {
                output::json_output(json!({
                    "command": "group.create",
                    "group": group,
                    "url": group.absolute_url(&services.urls),
                }));
            } else {
                output::success(&format!("Created group {}", output::highlight(&group.id)));
                output::field("Name", &group.name);
                output::field("Manager", &creator.fullname);
            }
            Ok(())
        }
        GroupCommand::Show(args) => show(services, &args.id).await,
        GroupCommand::Add(args) => {
            let group = services.groups.group(&GroupId::new(args.group)).await?;
            let user = require_user(services, &args.user).await?;
            let auth = acting_user(services, args.by.as_deref()).await?;
            let role = GroupRole::from(args.role);
            let changed = match role {
                GroupRole::Manager => services.groups.make_manager(&group, &user, auth.as_ref()).await?,
                GroupRole::Member => services.groups.make_member(&group, &user, auth.as_ref()).await?,
            };
            report(
                "group.add",
                changed,
                &format!("{} is now a {role} of {}", user.fullname, group.name),
                &format!("{} already is a {role} of {}", user.fullname, group.name),
            );
            Ok(())
        }
        GroupCommand::Invite(args) => {
            let group = services.groups.group(&GroupId::new(args.group)).await?;
            let auth = require_user(services, &args.by).await?;
            let role = GroupRole::from(args.role);
            let user = services
                .groups
                .add_unregistered_member(&group, &args.fullname, &args.email, &auth, role)
                .await?;
            if output::is_json() {
                output::json_output(json!({ "command": "group.invite", "user": user }));
            } else {
                output::success(&format!("Invited {} as {role}", user.fullname));
                output::field("User", &user.id);
                if let Some(record) = user.unclaimed_records.get(group.id.as_str()) {
                    output::field("Claim token", &record.token);
                }
            }
            Ok(())
        }
        GroupCommand::Remove(args) => {
            let group = services.groups.group(&GroupId::new(args.group)).await?;
            let user = require_user(services, &args.user).await?;
            let auth = acting_user(services, args.by.as_deref()).await?;
            let removed = services.groups.remove_member(&group, &user, auth.as_ref()).await?;
            report(
                "group.remove",
                removed,
                &format!("Removed {} from {}", user.fullname, group.name),
                &format!("{} is not in {}", user.fullname, group.name),
            );
            Ok(())
        }
        GroupCommand::Rename(args) => {
            let mut group = services.groups.group(&GroupId::new(args.group)).await?;
            let auth = acting_user(services, args.by.as_deref()).await?;
            let renamed = services
                .groups
                .set_group_name(&mut group, &args.name, auth.as_ref())
                .await?;
            report(
                "group.rename",
                renamed,
                &format!("Renamed group to {}", group.name),
                "Name unchanged",
            );
            Ok(())
        }
        GroupCommand::Connect(args) => {
            let group = services.groups.group(&GroupId::new(args.group)).await?;
            let node = require_node(services, &args.node).await?;
            let auth = acting_user(services, args.by.as_deref()).await?;
            let permission: Permission = args.permission.into();
            let changed = services
                .groups
                .add_group_to_node(&group, &node, permission, auth.as_ref())
                .await?;
            report(
                "group.connect",
                changed,
                &format!("{} has {permission} access to {}", group.name, node.title),
                &format!("{} already has {permission} access to {}", group.name, node.title),
            );
            Ok(())
        }
        GroupCommand::Disconnect(args) => {
            let group = services.groups.group(&GroupId::new(args.group)).await?;
            let node = require_node(services, &args.node).await?;
            let auth = acting_user(services, args.by.as_deref()).await?;
            let removed = services
                .groups
                .remove_group_from_node(&group, &node, auth.as_ref())
                .await?;
            report(
                "group.disconnect",
                removed,
                &format!("Disconnected {} from {}", group.name, node.title),
                &format!("{} has no access to {}", group.name, node.title),
            );
            Ok(())
        }
        GroupCommand::Delete(args) => {
            let group = services.groups.group(&GroupId::new(args.group)).await?;
            let auth = acting_user(services, args.by.as_deref()).await?;
            services.groups.remove_group(&group, auth.as_ref()).await?;
            report("group.delete", true, &format!("Deleted group {}", group.name), "");
            Ok(())
        }
    }
}

/// Print the outcome of a mutation that may have been a no-op.
fn report(command: &str, changed: bool, done: &str, unchanged: &str) {
    if output::is_json() {
        output::json_output(json!({ "command": command, "changed": changed }));
    } else if changed {
        output::success(done);
    } else {
        output::note(unchanged);
    }
}

async fn show(services: &Services, id: &str) -> Result<()> {
    let group = services.groups.group(&GroupId::new(id)).await?;
    let roster = services.groups.roster(&group).await?;
    let nodes = services.groups.nodes(&group).await?;

    let members: Vec<MemberRow> = roster
        .members()
        .map(|user| MemberRow {
            id: user.id.to_string(),
            name: user.fullname.clone(),
            role: if roster.is_manager(&user.id) {
                GroupRole::Manager.as_str()
            } else {
                GroupRole::Member.as_str()
            },
            registered: user.is_registered,
        })
        .collect();

    let mut grants = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let permission = services.groups.permission_on_node(&group, node).await?;
        grants.push(NodeRow {
            id: node.id.to_string(),
            title: node.title.clone(),
            permission: permission.map_or("-", |p| p.as_str()),
        });
    }

    if output::is_json() {
        let logs = services.groups.logs(&group).await?;
        let members: Vec<_> = members
            .iter()
            .map(|m| json!({ "id": m.id, "name": m.name, "role": m.role, "registered": m.registered }))
            .collect();
        let nodes: Vec<_> = grants
            .iter()
            .map(|n| json!({ "id": n.id, "title": n.title, "permission": n.permission }))
            .collect();
        output::json_output(json!({
            "command": "group.show",
            "group": group,
            "url": group.absolute_api_v2_url(&services.urls),
            "members": members,
            "nodes": nodes,
            "logs": logs,
        }));
        return Ok(());
    }

    output::section(&group.name);
    output::field("Id", &group.id);
    output::field("URL", group.absolute_url(&services.urls));
    match &group.creator_id {
        Some(creator) => output::field("Creator", creator),
        None => output::field("Creator", output::muted("unknown")),
    }
    output::field("Created", group.created.format("%Y-%m-%d %H:%M"));

    output::section("Members");
    output::lines(&Table::new(members).to_string());

    output::section("Projects");
    if grants.is_empty() {
        output::note("(none)");
    } else {
        output::lines(&Table::new(grants).to_string());
    }

    if output::verbosity() > 0 {
        output::section("Log");
        for log in services.groups.logs(&group).await? {
            output::note(&format!(
                "{} {} {}",
                log.created.format("%Y-%m-%d %H:%M"),
                log.action,
                log.user_id.as_ref().map_or("system", |u| u.as_str())
            ));
        }
    }
    Ok(())
}
