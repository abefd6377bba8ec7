//! Database model types for Diesel ORM.
//!
//! Timestamps are RFC 3339 text and JSON documents are stored as text.

use diesel::prelude::*;

use super::schema::{
    dataverse_node_settings, dataverse_user_accounts, dataverse_user_settings, external_accounts,
    file_metadata_schemas, node_logs, nodes, osf_group_logs, osf_group_memberships,
    osf_group_node_permissions, osf_groups, registration_schema_blocks, registration_schemas,
    users,
};

/// Database row for a user.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: String,
    pub fullname: String,
    pub email: Option<String>,
    pub is_registered: bool,
    pub is_disabled: bool,
    pub unclaimed_records: String,
    pub created: String,
}

/// Database row for a node.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = nodes)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NodeRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub parent_id: Option<String>,
    pub created: String,
}

/// Database row for a node log entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = node_logs)]
pub struct NewNodeLogRow {
    pub node_id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub params: String,
    pub created: String,
}

/// Database row for a node log entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = node_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NodeLogRow {
    pub id: i32,
    pub node_id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub params: String,
    pub created: String,
}

/// Database row for a registration schema.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = registration_schemas)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RegistrationSchemaRow {
    pub id: String,
    pub name: String,
    pub schema: String,
    pub category: Option<String>,
    pub active: bool,
    pub visible: bool,
    pub schema_version: i32,
    pub config: String,
    pub description: Option<String>,
    pub created: String,
    pub modified: String,
}

/// Database row for a file-metadata schema.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = file_metadata_schemas)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FileMetadataSchemaRow {
    pub id: String,
    pub name: String,
    pub schema: String,
    pub category: Option<String>,
    pub active: bool,
    pub visible: bool,
    pub schema_version: i32,
    pub created: String,
    pub modified: String,
}

/// Database row for a schema block.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = registration_schema_blocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SchemaBlockRow {
    pub id: String,
    pub schema_id: String,
    pub position: i32,
    pub help_text: String,
    pub example_text: Option<String>,
    pub registration_response_key: Option<String>,
    pub schema_block_group_key: Option<String>,
    pub block_type: String,
    pub display_text: String,
    pub required: bool,
}

/// Database row for a group.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = osf_groups)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub creator_id: Option<String>,
    pub created: String,
    pub modified: String,
}

/// Database row for a group membership.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = osf_group_memberships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MembershipRow {
    pub group_id: String,
    pub user_id: String,
    pub role: String,
}

/// Database row for one permission a group holds on a node.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = osf_group_node_permissions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NodePermissionRow {
    pub group_id: String,
    pub node_id: String,
    pub permission: String,
}

/// Database row for a group log entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = osf_group_logs)]
pub struct NewGroupLogRow {
    pub group_id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub params: String,
    pub created: String,
}

/// Database row for a group log entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = osf_group_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupLogRow {
    pub id: i32,
    pub group_id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub params: String,
    pub created: String,
}

/// Database row for an external account.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = external_accounts)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExternalAccountRow {
    pub id: String,
    pub provider: String,
    pub provider_id: String,
    pub display_name: Option<String>,
    pub oauth_key: String,
    pub oauth_secret: String,
    pub created: String,
}

/// Database row for Dataverse user settings.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = dataverse_user_settings)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DataverseUserSettingsRow {
    pub id: String,
    pub owner_id: String,
    pub deleted: bool,
    pub created: String,
    pub modified: String,
}

/// Link between user settings and a connected account.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = dataverse_user_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DataverseUserAccountRow {
    pub user_settings_id: String,
    pub account_id: String,
}

/// Database row for Dataverse node settings.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = dataverse_node_settings)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DataverseNodeSettingsRow {
    pub id: String,
    pub node_id: String,
    pub dataverse_alias: Option<String>,
    pub dataverse: Option<String>,
    pub dataset_doi: Option<String>,
    pub dataset_id: Option<String>,
    pub dataset: Option<String>,
    pub user_settings_id: Option<String>,
    pub external_account_id: Option<String>,
    pub deleted: bool,
    pub created: String,
    pub modified: String,
}
