//! Append-only activity logs for groups and nodes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{GroupId, NodeId, UserId};

/// Free-form log parameters, stored as a JSON object.
pub type LogParams = Map<String, Value>;

/// Actions recorded on a group's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLogAction {
    GroupCreated,
    MemberAdded,
    ManagerAdded,
    MemberRemoved,
    RoleUpdated,
    #[serde(rename = "edit_name")]
    EditedName,
    NodeConnected,
    #[serde(rename = "node_permissions_updated")]
    NodePermsUpdated,
    NodeDisconnected,
}

impl GroupLogAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GroupCreated => "group_created",
            Self::MemberAdded => "member_added",
            Self::ManagerAdded => "manager_added",
            Self::MemberRemoved => "member_removed",
            Self::RoleUpdated => "role_updated",
            Self::EditedName => "edit_name",
            Self::NodeConnected => "node_connected",
            Self::NodePermsUpdated => "node_permissions_updated",
            Self::NodeDisconnected => "node_disconnected",
        }
    }
}

impl fmt::Display for GroupLogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupLogAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::GroupCreated,
            Self::MemberAdded,
            Self::ManagerAdded,
            Self::MemberRemoved,
            Self::RoleUpdated,
            Self::EditedName,
            Self::NodeConnected,
            Self::NodePermsUpdated,
            Self::NodeDisconnected,
        ]
        .into_iter()
        .find(|action| action.as_str() == s)
        .ok_or_else(|| format!("unknown group log action: {s}"))
    }
}

/// Node log actions emitted by groups. Addons log free-form actions
/// (e.g. `dataverse_file_added`), so node logs store the action as text.
pub mod node_action {
    pub const GROUP_ADDED: &str = "group_added";
    pub const GROUP_UPDATED: &str = "group_updated";
    pub const GROUP_REMOVED: &str = "group_removed";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLog {
    pub id: Option<i32>,
    pub group_id: GroupId,
    pub action: GroupLogAction,
    pub user_id: Option<UserId>,
    pub params: LogParams,
    pub created: DateTime<Utc>,
}

impl GroupLog {
    pub fn new(
        group_id: GroupId,
        action: GroupLogAction,
        user_id: Option<UserId>,
        params: LogParams,
    ) -> Self {
        Self {
            id: None,
            group_id,
            action,
            user_id,
            params,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLog {
    pub id: Option<i32>,
    pub node_id: NodeId,
    pub action: String,
    pub user_id: Option<UserId>,
    pub params: LogParams,
    pub created: DateTime<Utc>,
}

impl NodeLog {
    pub fn new(
        node_id: NodeId,
        action: impl Into<String>,
        user_id: Option<UserId>,
        params: LogParams,
    ) -> Self {
        Self {
            id: None,
            node_id,
            action: action.into(),
            user_id,
            params,
            created: Utc::now(),
        }
    }
}

/// Build log params from `key => value` pairs.
#[macro_export]
macro_rules! log_params {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut params = $crate::domain::log::LogParams::new();
        $(params.insert($key.to_string(), ::serde_json::json!($value));)*
        params
    }};
}
