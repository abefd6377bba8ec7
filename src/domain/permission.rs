//! Permission vocabulary for nodes and groups.
//!
//! A group is granted a *set* of node-level permissions; the highest level in
//! the set is what callers see as the group's permission on the node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Highest-level permission a contributor or group holds on a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    #[default]
    Write,
    Admin,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }

    /// The node permission set that makes up this level.
    #[must_use]
    pub fn node_permissions(self) -> &'static [NodePermission] {
        match self {
            Self::Read => &[NodePermission::ReadNode],
            Self::Write => &[NodePermission::ReadNode, NodePermission::WriteNode],
            Self::Admin => &[
                NodePermission::ReadNode,
                NodePermission::WriteNode,
                NodePermission::AdminNode,
            ],
        }
    }

    /// Reduce a set of node permissions to its highest level.
    ///
    /// Returns `None` for an empty set.
    #[must_use]
    pub fn reduce(perms: &[NodePermission]) -> Option<Self> {
        if perms.contains(&NodePermission::AdminNode) {
            Some(Self::Admin)
        } else if perms.contains(&NodePermission::WriteNode) {
            Some(Self::Write)
        } else if perms.contains(&NodePermission::ReadNode) {
            Some(Self::Read)
        } else {
            None
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::InvalidPermission(other.to_string())),
        }
    }
}

/// A single object permission stored against a (group, node) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePermission {
    ReadNode,
    WriteNode,
    AdminNode,
}

impl NodePermission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadNode => "read_node",
            Self::WriteNode => "write_node",
            Self::AdminNode => "admin_node",
        }
    }
}

impl fmt::Display for NodePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodePermission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_node" => Ok(Self::ReadNode),
            "write_node" => Ok(Self::WriteNode),
            "admin_node" => Ok(Self::AdminNode),
            other => Err(DomainError::InvalidPermission(other.to_string())),
        }
    }
}

/// Which of a group's two sub-groups a user sits in.
///
/// Managers are always members as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    #[default]
    Member,
    Manager,
}

impl GroupRole {
    pub const ALL: [GroupRole; 2] = [GroupRole::Member, GroupRole::Manager];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "manager" => Ok(Self::Manager),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// Object permissions a user can hold on a group itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupPermission {
    /// Has group membership.
    Member,
    /// Can manage group membership.
    Manage,
}

impl GroupPermission {
    /// The sub-group whose users hold this permission.
    #[must_use]
    pub const fn granted_by(self) -> GroupRole {
        match self {
            Self::Member => GroupRole::Member,
            Self::Manage => GroupRole::Manager,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_sets_are_cumulative() {
        assert_eq!(Permission::Read.node_permissions().len(), 1);
        assert_eq!(Permission::Write.node_permissions().len(), 2);
        assert_eq!(Permission::Admin.node_permissions().len(), 3);
        assert!(Permission::Admin
            .node_permissions()
            .contains(&NodePermission::ReadNode));
    }

    #[test]
    fn reduce_picks_highest_level() {
        assert_eq!(
            Permission::reduce(&[NodePermission::ReadNode, NodePermission::WriteNode]),
            Some(Permission::Write)
        );
        assert_eq!(
            Permission::reduce(&[NodePermission::AdminNode]),
            Some(Permission::Admin)
        );
        assert_eq!(Permission::reduce(&[]), None);
    }

    #[test]
    fn invalid_permission_message() {
        let err = "owner".parse::<Permission>().unwrap_err();
        assert_eq!(err.to_string(), "owner is not a valid permission.");
    }

    #[test]
    fn manage_is_granted_by_manager_subgroup() {
        assert_eq!(GroupPermission::Manage.granted_by(), GroupRole::Manager);
        assert_eq!(GroupPermission::Member.granted_by(), GroupRole::Member);
    }

    #[test]
    fn roles_parse_from_lowercase() {
        assert_eq!("manager".parse::<GroupRole>().unwrap(), GroupRole::Manager);
        assert!("admin".parse::<GroupRole>().is_err());
    }
}
