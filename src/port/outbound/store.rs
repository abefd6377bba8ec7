//! Persistence ports for schemas, users, nodes, groups and addon settings.

use std::future::Future;

use crate::domain::{
    AccountId, DataverseNodeSettings, DataverseUserSettings, ExternalAccount, FileMetadataSchema,
    Group, GroupId, GroupLog, GroupRole, Node, NodeId, NodeLog, NodePermission,
    RegistrationSchema, Roster, SchemaBlock, SchemaId, User, UserId,
};
use crate::error::Result;

/// Stores that can group several writes into one atomic unit.
pub trait Transactional: Sized + Send + Sync {
    /// A handle whose reads and writes all run inside one transaction.
    ///
    /// Dropping the handle without [`commit`](Self::commit) rolls the
    /// transaction back. Beginning on a handle that is already inside a
    /// transaction joins it; only the outermost handle commits.
    fn begin(&self) -> impl Future<Output = Result<Self>> + Send;

    /// Commit the transaction opened by [`begin`](Self::begin).
    ///
    /// A no-op on handles that are not transactional or that joined an
    /// outer transaction.
    fn commit(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Storage operations for registration and file-metadata schemas.
pub trait SchemaStore: Send + Sync {
    /// Save a registration schema, replacing if it exists.
    fn save_registration_schema(
        &self,
        schema: &RegistrationSchema,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get a registration schema by ID.
    fn registration_schema(
        &self,
        id: &SchemaId,
    ) -> impl Future<Output = Result<Option<RegistrationSchema>>> + Send;

    /// Get the registration schema with this exact name and version.
    fn registration_schema_version(
        &self,
        name: &str,
        version: i32,
    ) -> impl Future<Output = Result<Option<RegistrationSchema>>> + Send;

    /// List every registration schema, all versions.
    fn registration_schemas(&self) -> impl Future<Output = Result<Vec<RegistrationSchema>>> + Send;

    /// Save a file-metadata schema, replacing if it exists.
    fn save_file_metadata_schema(
        &self,
        schema: &FileMetadataSchema,
    ) -> impl Future<Output = Result<()>> + Send;

    /// List every file-metadata schema, all versions.
    fn file_metadata_schemas(&self) -> impl Future<Output = Result<Vec<FileMetadataSchema>>> + Send;

    /// Replace all blocks of a schema.
    fn replace_blocks(
        &self,
        schema_id: &SchemaId,
        blocks: &[SchemaBlock],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Blocks of a schema ordered by position.
    fn blocks(&self, schema_id: &SchemaId) -> impl Future<Output = Result<Vec<SchemaBlock>>> + Send;
}

/// Storage operations for user accounts.
pub trait UserStore: Send + Sync {
    /// Save a user, replacing if it exists.
    fn save_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send;

    fn user(&self, id: &UserId) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Look a user up by (case-insensitive) email.
    fn user_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send;
}

/// Storage operations for nodes and their logs.
pub trait NodeStore: Send + Sync {
    fn save_node(&self, node: &Node) -> impl Future<Output = Result<()>> + Send;

    fn node(&self, id: &NodeId) -> impl Future<Output = Result<Option<Node>>> + Send;

    /// Append an entry to a node's log.
    fn add_node_log(&self, log: &NodeLog) -> impl Future<Output = Result<()>> + Send;

    /// A node's log, oldest first.
    fn node_logs(&self, node_id: &NodeId) -> impl Future<Output = Result<Vec<NodeLog>>> + Send;
}

/// Storage operations for groups, memberships, node grants and group logs.
pub trait GroupStore: Send + Sync {
    /// Save a group, replacing if it exists.
    fn save_group(&self, group: &Group) -> impl Future<Output = Result<()>> + Send;

    fn group(&self, id: &GroupId) -> impl Future<Output = Result<Option<Group>>> + Send;

    /// Delete a group with its memberships and node grants.
    fn delete_group(&self, id: &GroupId) -> impl Future<Output = Result<bool>> + Send;

    /// Groups `user_id` is a member of.
    fn groups_for_user(&self, user_id: &UserId) -> impl Future<Output = Result<Vec<Group>>> + Send;

    /// Current members with their roles.
    fn roster(&self, group_id: &GroupId) -> impl Future<Output = Result<Roster>> + Send;

    /// Put a user in the group with `role`, replacing any previous role.
    fn set_role(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
        role: GroupRole,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Take a user out of the group entirely.
    fn remove_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Node permissions the group's members hold on a node.
    fn node_permissions(
        &self,
        group_id: &GroupId,
        node_id: &NodeId,
    ) -> impl Future<Output = Result<Vec<NodePermission>>> + Send;

    /// Replace the group's grants on a node with `permissions`.
    fn set_node_permissions(
        &self,
        group_id: &GroupId,
        node_id: &NodeId,
        permissions: &[NodePermission],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove all of the group's grants on a node. Returns count removed.
    fn remove_node_permissions(
        &self,
        group_id: &GroupId,
        node_id: &NodeId,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Nodes the group can read.
    fn group_nodes(&self, group_id: &GroupId) -> impl Future<Output = Result<Vec<Node>>> + Send;

    /// Append an entry to a group's log.
    fn add_group_log(&self, log: &GroupLog) -> impl Future<Output = Result<()>> + Send;

    /// A group's log, oldest first.
    fn group_logs(&self, group_id: &GroupId) -> impl Future<Output = Result<Vec<GroupLog>>> + Send;
}

/// Storage operations for external accounts and Dataverse settings.
pub trait AddonStore: Send + Sync {
    fn save_external_account(
        &self,
        account: &ExternalAccount,
    ) -> impl Future<Output = Result<()>> + Send;

    fn external_account(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<ExternalAccount>>> + Send;

    /// The account `provider` knows as `provider_id`; unique per provider.
    fn external_account_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> impl Future<Output = Result<Option<ExternalAccount>>> + Send;

    /// Save user settings together with their account links.
    fn save_dataverse_user_settings(
        &self,
        settings: &DataverseUserSettings,
    ) -> impl Future<Output = Result<()>> + Send;

    fn dataverse_user_settings(
        &self,
        owner: &UserId,
    ) -> impl Future<Output = Result<Option<DataverseUserSettings>>> + Send;

    fn save_dataverse_node_settings(
        &self,
        settings: &DataverseNodeSettings,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Node settings with the linked account and user settings loaded.
    fn dataverse_node_settings(
        &self,
        node_id: &NodeId,
    ) -> impl Future<Output = Result<Option<DataverseNodeSettings>>> + Send;
}
