//! Dataverse storage addon settings.
//!
//! A user connects one or more Dataverse installations (as
//! [`ExternalAccount`]s) through their [`DataverseUserSettings`]. A node is
//! then linked to one dataset through [`DataverseNodeSettings`], authorized by
//! exactly one of those accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ExternalAccount;
use crate::domain::id::{AccountId, NodeId, SettingsId, UserId};
use crate::domain::log::NodeLog;
use crate::domain::node::Node;
use crate::domain::user::User;
use crate::error::{Error, Result};
use crate::log_params;

pub const SHORT_NAME: &str = "dataverse";
pub const FULL_NAME: &str = "Dataverse";

pub const NODE_AUTHORIZED: &str = "dataverse_node_authorized";
pub const NODE_DEAUTHORIZED: &str = "dataverse_node_deauthorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataverseUserSettings {
    pub id: SettingsId,
    pub owner_id: UserId,
    /// Dataverse accounts the owner has connected.
    pub external_account_ids: Vec<AccountId>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl DataverseUserSettings {
    pub fn new(owner_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: SettingsId::generate(),
            owner_id,
            external_account_ids: Vec::new(),
            created: now,
            modified: now,
        }
    }

    #[must_use]
    pub fn has_auth(&self) -> bool {
        !self.external_account_ids.is_empty()
    }

    #[must_use]
    pub fn owns_account(&self, account_id: &AccountId) -> bool {
        self.external_account_ids.contains(account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataverseNodeSettings {
    pub id: SettingsId,
    pub node_id: NodeId,
    pub dataverse_alias: Option<String>,
    pub dataverse: Option<String>,
    pub dataset_doi: Option<String>,
    /// Resolved from the DOI on first use; see `DataverseService::dataset_id`.
    pub dataset_id: Option<String>,
    pub dataset: Option<String>,
    pub user_settings: Option<DataverseUserSettings>,
    pub external_account: Option<ExternalAccount>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl DataverseNodeSettings {
    pub fn new(node_id: NodeId) -> Self {
        let now = Utc::now();
        Self {
            id: SettingsId::generate(),
            node_id,
            dataverse_alias: None,
            dataverse: None,
            dataset_doi: None,
            dataset_id: None,
            dataset: None,
            user_settings: None,
            external_account: None,
            created: now,
            modified: now,
        }
    }

    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.external_account.is_some() && self.user_settings.is_some()
    }

    /// Authorized and pointing at a dataset.
    #[must_use]
    pub fn complete(&self) -> bool {
        self.has_auth() && self.dataset_doi.is_some()
    }

    /// The user whose account authorizes this node, if any.
    #[must_use]
    pub fn authorizer(&self) -> Option<&UserId> {
        self.user_settings.as_ref().map(|s| &s.owner_id)
    }

    fn authorized_by(&self, user_id: &UserId) -> bool {
        self.authorizer() == Some(user_id)
    }

    /// Link `account` (owned through `user_settings`) to this node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permissions`] when the account is not one of the
    /// user's connected accounts.
    pub fn set_auth(
        &mut self,
        account: ExternalAccount,
        user_settings: DataverseUserSettings,
    ) -> Result<()> {
        if !user_settings.owns_account(&account.id) {
            return Err(Error::Permissions(
                "User does not own the external account".into(),
            ));
        }
        self.external_account = Some(account);
        self.user_settings = Some(user_settings);
        self.touch();
        Ok(())
    }

    pub fn clear_auth(&mut self) {
        self.external_account = None;
        self.user_settings = None;
        self.touch();
    }

    /// Select the dataset this node stores files in.
    pub fn set_dataset(
        &mut self,
        alias: impl Into<String>,
        dataverse: impl Into<String>,
        doi: impl Into<String>,
        title: impl Into<String>,
    ) {
        self.dataverse_alias = Some(alias.into());
        self.dataverse = Some(dataverse.into());
        self.dataset_doi = Some(doi.into());
        self.dataset = Some(title.into());
        self.dataset_id = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Drop the dataset link and the authorization.
    ///
    /// Returns the `dataverse_node_deauthorized` log entry when `add_log` is
    /// set.
    pub fn deauthorize(
        &mut self,
        node: &Node,
        auth: Option<&UserId>,
        add_log: bool,
    ) -> Option<NodeLog> {
        self.dataverse_alias = None;
        self.dataverse = None;
        self.dataset_doi = None;
        self.dataset_id = None;
        self.dataset = None;
        self.clear_auth();

        add_log.then(|| {
            NodeLog::new(
                node.id.clone(),
                NODE_DEAUTHORIZED,
                auth.cloned(),
                log_params! {
                    "project" => node.parent_id,
                    "node" => node.id,
                },
            )
        })
    }

    /// Credentials handed to WaterButler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Addon`] when the node is not authorized.
    pub fn serialize_waterbutler_credentials(&self) -> Result<Value> {
        match (&self.external_account, self.has_auth()) {
            (Some(account), true) => Ok(json!({ "token": account.oauth_secret })),
            _ => Err(Error::Addon("Addon is not authorized".into())),
        }
    }

    /// Settings handed to WaterButler. `dataset_id` must already be resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Addon`] when no external account is linked.
    pub fn serialize_waterbutler_settings(&self) -> Result<Value> {
        let account = self
            .external_account
            .as_ref()
            .ok_or_else(|| Error::Addon("Addon is not authorized".into()))?;
        Ok(json!({
            "host": account.oauth_key,
            "doi": self.dataset_doi,
            "id": self.dataset_id,
            "name": self.dataset,
        }))
    }

    /// Log entry for a file action WaterButler reported back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `metadata` has no `path`, or
    /// [`Error::Url`] when `full_path` is not a valid path.
    pub fn create_waterbutler_log(
        &self,
        node: &Node,
        auth: Option<&UserId>,
        action: &str,
        metadata: &Value,
    ) -> Result<NodeLog> {
        let path = metadata
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("metadata is missing 'path'".into()))?;
        let name = match metadata.get("name") {
            Some(name) => name.clone(),
            None => file_name_from_full_path(metadata.get("full_path").and_then(Value::as_str))?,
        };
        let url = node.file_url(SHORT_NAME, path);

        Ok(NodeLog::new(
            node.id.clone(),
            format!("{SHORT_NAME}_{action}"),
            auth.cloned(),
            log_params! {
                "project" => node.parent_id,
                "node" => node.id,
                "dataset" => self.dataset,
                "filename" => name,
                "urls" => json!({
                    "view": url,
                    "download": format!("{url}?action=download"),
                }),
            },
        ))
    }

    /// Warning shown before registering: Dataverse content is not copied.
    #[must_use]
    pub fn before_register_message(&self, node: &Node) -> Option<String> {
        let authorized = self.user_settings.as_ref().is_some_and(DataverseUserSettings::has_auth);
        authorized.then(|| {
            format!(
                "The contents of Dataverse add-ons cannot be registered at this time; \
                 the Dataverse dataset linked to this {} will not be included \
                 as part of this registration.",
                node.project_or_component()
            )
        })
    }

    #[must_use]
    pub fn before_fork_message(&self, node: &Node, user: &UserId) -> String {
        let category = node.project_or_component();
        if self.authorized_by(user) {
            format!(
                "Because you have authorized the Dataverse add-on for this {category}, \
                 forking it will also transfer your authentication to the forked {category}."
            )
        } else {
            format!(
                "Because the Dataverse add-on has been authorized by a different user, \
                 forking it will not transfer authentication to the forked {category}."
            )
        }
    }

    #[must_use]
    pub fn before_remove_contributor_message(&self, node: &Node, removed: &User) -> Option<String> {
        self.authorized_by(&removed.id).then(|| {
            format!(
                "The Dataverse add-on for this {} is authenticated by {}. \
                 Removing this user will also remove write access to Dataverse \
                 unless another contributor re-authenticates the add-on.",
                node.project_or_component(),
                removed.fullname
            )
        })
    }

    /// Settings for `fork`, plus the message shown to the forking user.
    ///
    /// Authorization carries over only when `user` authorized this node.
    #[must_use]
    pub fn after_fork(&self, fork: &Node, user: &UserId) -> (Self, String) {
        let now = Utc::now();
        let mut clone = Self {
            id: SettingsId::generate(),
            node_id: fork.id.clone(),
            user_settings: None,
            created: now,
            modified: now,
            ..self.clone()
        };

        let category = fork.project_or_component();
        let message = if self.authorized_by(user) {
            clone.user_settings = self.user_settings.clone();
            format!("Dataverse authorization copied to forked {category}.")
        } else {
            format!(
                "Dataverse authorization not copied to forked {category}. You may \
                 authorize this fork on the <a href=\"{}\">Settings</a> page.",
                fork.settings_url()
            )
        };
        (clone, message)
    }

    /// Drop the authorization when its owner leaves the node.
    #[must_use]
    pub fn after_remove_contributor(
        &mut self,
        node: &Node,
        removed: &User,
        auth: Option<&UserId>,
    ) -> Option<String> {
        if !self.authorized_by(&removed.id) {
            return None;
        }
        self.user_settings = None;
        self.touch();

        let mut message = format!(
            "Because the Dataverse add-on for {} \"{}\" was authenticated by {}, \
             authentication information has been deleted.",
            node.category_display(),
            node.title,
            removed.fullname
        );
        if auth != Some(&removed.id) {
            message.push_str(&format!(
                " You can re-authenticate on the <a href=\"{}\">Settings</a> page.",
                node.settings_url()
            ));
        }
        Some(message)
    }

    /// Deauthorize with a log entry once the node is deleted.
    pub fn after_delete(&mut self, node: &Node, user: &UserId) -> Option<NodeLog> {
        self.deauthorize(node, Some(user), true)
    }

    /// The payload the node settings page renders.
    #[must_use]
    pub fn serialize(&self, viewer: &UserId, viewer_settings: Option<&DataverseUserSettings>) -> Value {
        json!({
            "nodeHasAuth": self.has_auth(),
            "userHasAuth": viewer_settings.is_some_and(DataverseUserSettings::has_auth),
            "userIsOwner": self.authorized_by(viewer),
            "ownerId": self.authorizer(),
            "host": self.external_account.as_ref().map(|a| a.oauth_key.clone()),
            "externalAccountId": self.external_account.as_ref().map(|a| a.id.clone()),
            "dataverse": self.dataverse,
            "dataverseAlias": self.dataverse_alias,
            "dataset": self.dataset,
            "datasetDoi": self.dataset_doi,
            "hasDataset": self.dataset_doi.is_some(),
            "complete": self.complete(),
        })
    }
}

/// WaterButler reports the file name as the `name` query parameter of
/// `full_path` when it does not send `name` directly.
fn file_name_from_full_path(full_path: Option<&str>) -> Result<Value> {
    let Some(full_path) = full_path else {
        return Ok(Value::Null);
    };
    let parsed = url::Url::parse("http://localhost/")?.join(full_path)?;
    Ok(parsed
        .query_pairs()
        .find(|(key, _)| key == "name")
        .map_or(Value::Null, |(_, value)| Value::String(value.into_owned())))
}

/// A file stored in a node's Dataverse dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataverseFile {
    pub node_id: NodeId,
    pub file_id: String,
}

impl DataverseFile {
    /// File for a WaterButler `path` such as `/12345`.
    pub fn from_path(node_id: NodeId, path: &str) -> Self {
        Self {
            node_id,
            file_id: path.trim_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn waterbutler_path(&self) -> String {
        format!("/{}", self.file_id)
    }

    #[must_use]
    pub const fn provider(&self) -> &'static str {
        SHORT_NAME
    }

    #[must_use]
    pub const fn version_identifier(&self) -> &'static str {
        "version"
    }

    #[must_use]
    pub fn unique_identifier(&self) -> &str {
        &self.file_id
    }

    /// Whether a viewer may see this file given its cached metadata.
    ///
    /// Viewers without edit permission only see published files. Metadata
    /// lacking the flag does not hide the file.
    #[must_use]
    pub fn visible_to(&self, can_edit: bool, metadata: &Value) -> bool {
        if can_edit {
            return true;
        }
        metadata
            .get("extra")
            .and_then(|extra| extra.get("hasPublishedVersion"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorized(node: &Node, owner: &User) -> DataverseNodeSettings {
        let account = ExternalAccount::new(SHORT_NAME, "tok", "demo.dataverse.org", "tok");
        let mut user_settings = DataverseUserSettings::new(owner.id.clone());
        user_settings.external_account_ids.push(account.id.clone());
        let mut settings = DataverseNodeSettings::new(node.id.clone());
        settings.set_auth(account, user_settings).unwrap();
        settings.set_dataset("ALIAS", "My Dataverse", "doi:10.5072/FK2/ABC", "My Dataset");
        settings
    }

    #[test]
    fn auth_and_completeness() {
        let node = Node::new("Project");
        let owner = User::registered("Owner", "o@example.com");
        let mut settings = DataverseNodeSettings::new(node.id.clone());
        assert!(!settings.has_auth());
        assert!(!settings.complete());

        settings = authorized(&node, &owner);
        assert!(settings.has_auth());
        assert!(settings.complete());

        settings.dataset_doi = None;
        assert!(!settings.complete());
    }

    #[test]
    fn set_auth_rejects_foreign_account() {
        let node = Node::new("Project");
        let account = ExternalAccount::new(SHORT_NAME, "t", "h", "t");
        let user_settings = DataverseUserSettings::new(User::registered("U", "u@example.com").id);
        let mut settings = DataverseNodeSettings::new(node.id);
        assert!(matches!(
            settings.set_auth(account, user_settings),
            Err(Error::Permissions(_))
        ));
    }

    #[test]
    fn waterbutler_payloads() {
        let node = Node::new("Project");
        let owner = User::registered("Owner", "o@example.com");
        let mut settings = authorized(&node, &owner);
        settings.dataset_id = Some("42".into());

        assert_eq!(
            settings.serialize_waterbutler_credentials().unwrap(),
            json!({"token": "tok"})
        );
        assert_eq!(
            settings.serialize_waterbutler_settings().unwrap(),
            json!({
                "host": "demo.dataverse.org",
                "doi": "doi:10.5072/FK2/ABC",
                "id": "42",
                "name": "My Dataset"
            })
        );

        settings.clear_auth();
        match settings.serialize_waterbutler_credentials() {
            Err(Error::Addon(msg)) => assert_eq!(msg, "Addon is not authorized"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deauthorize_clears_everything_and_logs() {
        let project = Node::new("Project");
        let node = Node::component("Data", &project.id);
        let owner = User::registered("Owner", "o@example.com");
        let mut settings = authorized(&node, &owner);

        let log = settings.deauthorize(&node, Some(&owner.id), true).unwrap();
        assert_eq!(log.action, NODE_DEAUTHORIZED);
        assert_eq!(log.params["project"], json!(project.id));
        assert_eq!(log.params["node"], json!(node.id));
        assert!(settings.dataset_doi.is_none());
        assert!(settings.dataverse_alias.is_none());
        assert!(!settings.has_auth());

        let mut again = authorized(&node, &owner);
        assert!(again.deauthorize(&node, None, false).is_none());
    }

    #[test]
    fn waterbutler_log_reads_name_from_full_path() {
        let node = Node::new("Project");
        let owner = User::registered("Owner", "o@example.com");
        let settings = authorized(&node, &owner);

        let log = settings
            .create_waterbutler_log(
                &node,
                Some(&owner.id),
                "file_added",
                &json!({"path": "/123", "full_path": "/123?name=data%20set.csv"}),
            )
            .unwrap();
        assert_eq!(log.action, "dataverse_file_added");
        assert_eq!(log.params["filename"], "data set.csv");
        assert_eq!(log.params["dataset"], "My Dataset");
        let view = format!("/{}/files/dataverse/123", node.id);
        assert_eq!(log.params["urls"]["view"], json!(view));
        assert_eq!(log.params["urls"]["download"], json!(format!("{view}?action=download")));

        let named = settings
            .create_waterbutler_log(&node, None, "file_removed", &json!({"path": "/1", "name": "a.txt"}))
            .unwrap();
        assert_eq!(named.params["filename"], "a.txt");
    }

    #[test]
    fn fork_copies_auth_only_for_authorizer() {
        let node = Node::new("Project");
        let owner = User::registered("Owner", "o@example.com");
        let other = User::registered("Other", "x@example.com");
        let settings = authorized(&node, &owner);
        let fork = Node::new("Fork");

        let (clone, message) = settings.after_fork(&fork, &owner.id);
        assert!(clone.has_auth());
        assert_eq!(clone.node_id, fork.id);
        assert_ne!(clone.id, settings.id);
        assert_eq!(message, "Dataverse authorization copied to forked project.");

        let (clone, message) = settings.after_fork(&fork, &other.id);
        assert!(!clone.has_auth());
        assert_eq!(clone.dataset_doi, settings.dataset_doi);
        assert!(message.contains(&fork.settings_url()));
    }

    #[test]
    fn removing_authorizer_drops_auth() {
        let node = Node::new("Project");
        let owner = User::registered("Owner", "o@example.com");
        let other = User::registered("Other", "x@example.com");
        let mut settings = authorized(&node, &owner);

        assert!(settings.before_remove_contributor_message(&node, &other).is_none());
        assert!(settings
            .before_remove_contributor_message(&node, &owner)
            .unwrap()
            .contains("authenticated by Owner"));
        assert!(settings.after_remove_contributor(&node, &other, None).is_none());

        let message = settings
            .after_remove_contributor(&node, &owner, Some(&other.id))
            .unwrap();
        assert!(message.contains("You can re-authenticate"));
        assert!(!settings.has_auth());
    }

    #[test]
    fn register_and_fork_messages() {
        let node = Node::new("Project");
        let owner = User::registered("Owner", "o@example.com");
        let settings = authorized(&node, &owner);

        assert!(settings.before_register_message(&node).unwrap().contains("cannot be registered"));
        assert!(settings
            .before_fork_message(&node, &owner.id)
            .starts_with("Because you have authorized"));
        assert!(DataverseNodeSettings::new(node.id.clone())
            .before_register_message(&node)
            .is_none());
    }

    #[test]
    fn unpublished_files_hidden_from_readers() {
        let file = DataverseFile::from_path(NodeId::new("abcde"), "/99/");
        assert_eq!(file.waterbutler_path(), "/99");
        assert_eq!(file.unique_identifier(), "99");
        assert_eq!(file.provider(), "dataverse");

        let draft = json!({"extra": {"hasPublishedVersion": false}});
        assert!(!file.visible_to(false, &draft));
        assert!(file.visible_to(true, &draft));
        assert!(file.visible_to(false, &json!({})));
    }
}
