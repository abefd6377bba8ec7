//! Dataverse addon use cases.
//!
//! Connects user accounts, authorizes nodes, resolves dataset ids through
//! the installation's API and runs the node lifecycle hooks that need
//! persistence.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::domain::addon::dataverse::{NODE_AUTHORIZED, SHORT_NAME};
use crate::domain::{
    AccountId, DataverseNodeSettings, DataverseUserSettings, ExternalAccount, Node, NodeLog, User,
    UserId,
};
use crate::error::{Error, Result};
use crate::log_params;
use crate::port::outbound::dataverse::DataverseApi;
use crate::port::outbound::store::{AddonStore, NodeStore, Transactional};

const FORBIDDEN: &str = "User does not own the external account";

pub struct DataverseService<S, A: ?Sized> {
    store: Arc<S>,
    api: Arc<A>,
}

impl<S, A> DataverseService<S, A>
where
    S: AddonStore + NodeStore + Transactional,
    A: DataverseApi + ?Sized,
{
    pub fn new(store: Arc<S>, api: Arc<A>) -> Self {
        Self { store, api }
    }

    /// A copy of the service whose store calls share one transaction.
    async fn begin(&self) -> Result<Self> {
        Ok(Self {
            store: Arc::new(self.store.begin().await?),
            api: Arc::clone(&self.api),
        })
    }

    /// Connect a Dataverse installation to `user` with an API token.
    ///
    /// Accounts are keyed by token, so users sharing a token share the
    /// account. Reconnecting a host the user already has replaces its token.
    pub async fn connect_account(&self, user: &User, host: &str, token: &str) -> Result<ExternalAccount> {
        let tx = self.begin().await?;
        let mut settings = tx
            .store
            .dataverse_user_settings(&user.id)
            .await?
            .unwrap_or_else(|| DataverseUserSettings::new(user.id.clone()));

        let mut account = tx.store.external_account_by_provider_id(SHORT_NAME, token).await?;
        if account.is_none() {
            for id in &settings.external_account_ids {
                if let Some(existing) = tx.store.external_account(id).await? {
                    if existing.oauth_key == host {
                        account = Some(existing);
                        break;
                    }
                }
            }
        }
        let mut account = account.unwrap_or_else(|| ExternalAccount::new(SHORT_NAME, token, host, token));
        account.provider_id = token.to_string();
        account.oauth_key = host.to_string();
        account.oauth_secret = token.to_string();
        account.display_name = Some(host.to_string());
        tx.store.save_external_account(&account).await?;

        if !settings.owns_account(&account.id) {
            settings.external_account_ids.push(account.id.clone());
        }
        settings.modified = chrono::Utc::now();
        tx.store.save_dataverse_user_settings(&settings).await?;
        tx.store.commit().await?;

        info!(user = %user.id, host, account = %account.id, "Dataverse account connected");
        Ok(account)
    }

    pub async fn user_settings(&self, user: &UserId) -> Result<Option<DataverseUserSettings>> {
        self.store.dataverse_user_settings(user).await
    }

    /// Settings for `node`, created empty on first access.
    pub async fn node_settings(&self, node: &Node) -> Result<DataverseNodeSettings> {
        if let Some(settings) = self.store.dataverse_node_settings(&node.id).await? {
            return Ok(settings);
        }
        let settings = DataverseNodeSettings::new(node.id.clone());
        self.store.save_dataverse_node_settings(&settings).await?;
        debug!(node = %node.id, "Dataverse node settings created");
        Ok(settings)
    }

    async fn existing_node_settings(&self, node: &Node) -> Result<DataverseNodeSettings> {
        self.store
            .dataverse_node_settings(&node.id)
            .await?
            .ok_or_else(|| Error::not_found("dataverse settings", &node.id))
    }

    /// Authorize `node` with one of `user`'s connected accounts.
    ///
    /// Returns `{"result": <serialized node settings>}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permissions`] when the account is not the user's.
    pub async fn add_user_auth(&self, node: &Node, user: &User, external_account_id: &AccountId) -> Result<Value> {
        let tx = self.begin().await?;
        let value = tx.authorize(node, user, external_account_id).await?;
        tx.store.commit().await?;
        Ok(value)
    }

    async fn authorize(&self, node: &Node, user: &User, external_account_id: &AccountId) -> Result<Value> {
        let account = self
            .store
            .external_account(external_account_id)
            .await?
            .ok_or_else(|| Error::not_found("external account", external_account_id))?;
        let user_settings = self
            .store
            .dataverse_user_settings(&user.id)
            .await?
            .filter(|s| s.owns_account(&account.id))
            .ok_or_else(|| Error::Permissions(FORBIDDEN.into()))?;

        let mut settings = self.node_settings(node).await?;
        settings.set_auth(account, user_settings.clone())?;
        self.store.save_dataverse_node_settings(&settings).await?;

        self.store
            .add_node_log(&NodeLog::new(
                node.id.clone(),
                NODE_AUTHORIZED,
                Some(user.id.clone()),
                log_params! {
                    "project" => node.parent_id,
                    "node" => node.id,
                },
            ))
            .await?;

        info!(node = %node.id, user = %user.id, "Dataverse node authorized");
        Ok(json!({ "result": settings.serialize(&user.id, Some(&user_settings)) }))
    }

    /// Deauthorize `node` on behalf of `user`.
    ///
    /// Returns `{"result": <serialized node settings>}`.
    pub async fn remove_user_auth(&self, node: &Node, user: &User) -> Result<Value> {
        let tx = self.begin().await?;
        tx.clear_auth(node, Some(&user.id), true).await?;
        let settings = tx.existing_node_settings(node).await?;
        let user_settings = tx.store.dataverse_user_settings(&user.id).await?;
        tx.store.commit().await?;
        Ok(json!({ "result": settings.serialize(&user.id, user_settings.as_ref()) }))
    }

    /// Clear the dataset link and authorization of `node`.
    pub async fn deauthorize(&self, node: &Node, auth: Option<&UserId>, add_log: bool) -> Result<()> {
        let tx = self.begin().await?;
        tx.clear_auth(node, auth, add_log).await?;
        tx.store.commit().await
    }

    async fn clear_auth(&self, node: &Node, auth: Option<&UserId>, add_log: bool) -> Result<()> {
        let mut settings = self.node_settings(node).await?;
        let log = settings.deauthorize(node, auth, add_log);
        self.store.save_dataverse_node_settings(&settings).await?;
        if let Some(log) = log {
            self.store.add_node_log(&log).await?;
        }
        info!(node = %node.id, "Dataverse node deauthorized");
        Ok(())
    }

    /// Point `node` at a dataset. The dataset id is resolved on next use.
    pub async fn set_dataset(
        &self,
        node: &Node,
        alias: &str,
        dataverse: &str,
        doi: &str,
        title: &str,
    ) -> Result<DataverseNodeSettings> {
        let mut settings = self.node_settings(node).await?;
        settings.set_dataset(alias, dataverse, doi, title);
        self.store.save_dataverse_node_settings(&settings).await?;
        debug!(node = %node.id, doi, "Dataverse dataset selected");
        Ok(settings)
    }

    /// The dataset id of `settings`, looked up by DOI when not yet known.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without a linked account, and
    /// [`Error::NotFound`] when the dataverse has no dataset with the DOI.
    pub async fn dataset_id(&self, settings: &mut DataverseNodeSettings) -> Result<String> {
        if let Some(id) = &settings.dataset_id {
            return Ok(id.clone());
        }

        let account = match (&settings.external_account, settings.has_auth()) {
            (Some(account), true) => account,
            _ => return Err(Error::Unauthorized("Dataverse addon is not authorized".into())),
        };
        let (Some(alias), Some(doi)) = (&settings.dataverse_alias, &settings.dataset_doi) else {
            return Err(Error::Addon("No dataset selected".into()));
        };

        let dataset = self
            .api
            .dataset_by_doi(&account.oauth_key, &account.oauth_secret, alias, doi)
            .await
            .map_err(|e| {
                warn!(provider = self.api.name(), error = %e, "Dataset lookup failed");
                e
            })?
            .ok_or_else(|| Error::not_found("dataset", doi))?;

        settings.dataset_id = Some(dataset.id.clone());
        self.store.save_dataverse_node_settings(settings).await?;
        debug!(node = %settings.node_id, dataset = %dataset.id, "Dataset id resolved");
        Ok(dataset.id)
    }

    /// `{token}` for WaterButler.
    pub async fn waterbutler_credentials(&self, node: &Node) -> Result<Value> {
        self.existing_node_settings(node)
            .await?
            .serialize_waterbutler_credentials()
    }

    /// `{host, doi, id, name}` for WaterButler, resolving the dataset id.
    pub async fn waterbutler_settings(&self, node: &Node) -> Result<Value> {
        let mut settings = self.existing_node_settings(node).await?;
        self.dataset_id(&mut settings).await?;
        settings.serialize_waterbutler_settings()
    }

    /// Record a file action reported by WaterButler on the node log.
    pub async fn create_waterbutler_log(
        &self,
        node: &Node,
        auth: Option<&UserId>,
        action: &str,
        metadata: &Value,
    ) -> Result<NodeLog> {
        let settings = self.existing_node_settings(node).await?;
        let log = settings.create_waterbutler_log(node, auth, action, metadata)?;
        self.store.add_node_log(&log).await?;
        Ok(log)
    }

    /// Copy the settings of `node` onto its fork.
    ///
    /// Returns the message for the forking user, or `None` when `node` has no
    /// Dataverse settings.
    pub async fn after_fork(&self, node: &Node, fork: &Node, user: &UserId) -> Result<Option<String>> {
        let Some(settings) = self.store.dataverse_node_settings(&node.id).await? else {
            return Ok(None);
        };
        let (cloned, message) = settings.after_fork(fork, user);
        self.store.save_dataverse_node_settings(&cloned).await?;
        info!(node = %node.id, fork = %fork.id, "Dataverse settings forked");
        Ok(Some(message))
    }

    /// Drop the authorization when its owner leaves `node`.
    pub async fn after_remove_contributor(
        &self,
        node: &Node,
        removed: &User,
        auth: Option<&UserId>,
    ) -> Result<Option<String>> {
        let Some(mut settings) = self.store.dataverse_node_settings(&node.id).await? else {
            return Ok(None);
        };
        let message = settings.after_remove_contributor(node, removed, auth);
        if message.is_some() {
            self.store.save_dataverse_node_settings(&settings).await?;
            info!(node = %node.id, user = %removed.id, "Dataverse authorization dropped");
        }
        Ok(message)
    }

    /// Deauthorize with a log entry once `node` is deleted.
    pub async fn after_delete(&self, node: &Node, user: &UserId) -> Result<()> {
        let tx = self.begin().await?;
        let Some(mut settings) = tx.store.dataverse_node_settings(&node.id).await? else {
            return Ok(());
        };
        let log = settings.after_delete(node, user);
        tx.store.save_dataverse_node_settings(&settings).await?;
        if let Some(log) = log {
            tx.store.add_node_log(&log).await?;
        }
        tx.store.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::SqliteStore;
    use crate::port::outbound::store::UserStore;
    use crate::testkit::dataverse::ScriptedDataverse;
    use crate::testkit::domain::{project, user};
    use crate::testkit::store::memory_store;

    const HOST: &str = "demo.dataverse.org";
    const DOI: &str = "doi:10.5072/FK2/ABCDEF";

    struct Fixture {
        service: DataverseService<SqliteStore, ScriptedDataverse>,
        store: Arc<SqliteStore>,
        api: Arc<ScriptedDataverse>,
        owner: User,
        node: Node,
    }

    async fn fixture(api: ScriptedDataverse) -> Fixture {
        let store = Arc::new(memory_store());
        let api = Arc::new(api);
        let owner = user("Owner");
        let node = project("Project");
        store.save_user(&owner).await.unwrap();
        store.save_node(&node).await.unwrap();
        Fixture {
            service: DataverseService::new(store.clone(), api.clone()),
            store,
            api,
            owner,
            node,
        }
    }

    async fn authorized(api: ScriptedDataverse) -> Fixture {
        let f = fixture(api).await;
        let account = f.service.connect_account(&f.owner, HOST, "secret").await.unwrap();
        f.service.add_user_auth(&f.node, &f.owner, &account.id).await.unwrap();
        f.service
            .set_dataset(&f.node, "alias", "Demo Dataverse", DOI, "Dataset")
            .await
            .unwrap();
        f
    }

    async fn node_actions(f: &Fixture) -> Vec<String> {
        f.store
            .node_logs(&f.node.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.action)
            .collect()
    }

    #[tokio::test]
    async fn connecting_twice_keeps_one_account_per_host() {
        let f = fixture(ScriptedDataverse::new()).await;
        let first = f.service.connect_account(&f.owner, HOST, "one").await.unwrap();
        let second = f.service.connect_account(&f.owner, HOST, "two").await.unwrap();
        assert_eq!(first.id, second.id);

        let settings = f.service.user_settings(&f.owner.id).await.unwrap().unwrap();
        assert_eq!(settings.external_account_ids, vec![first.id.clone()]);
        let stored = f.store.external_account(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.oauth_secret, "two");
        assert_eq!(stored.provider_id, "two");
    }

    #[tokio::test]
    async fn two_users_connect_the_same_host() {
        let f = fixture(ScriptedDataverse::new()).await;
        let colleague = user("Colleague");
        f.store.save_user(&colleague).await.unwrap();

        let mine = f.service.connect_account(&f.owner, HOST, "mine").await.unwrap();
        let theirs = f.service.connect_account(&colleague, HOST, "theirs").await.unwrap();
        assert_ne!(mine.id, theirs.id);
        assert_eq!(theirs.provider_id, "theirs");
        assert_eq!(theirs.oauth_key, HOST);
        assert_eq!(theirs.display_name.as_deref(), Some(HOST));

        // a shared token means a shared account
        let shared = f.service.connect_account(&colleague, HOST, "mine").await.unwrap();
        assert_eq!(shared.id, mine.id);
        let settings = f.service.user_settings(&colleague.id).await.unwrap().unwrap();
        assert!(settings.owns_account(&mine.id));
        assert!(settings.owns_account(&theirs.id));
    }

    #[tokio::test]
    async fn add_user_auth_logs_and_serializes() {
        let f = fixture(ScriptedDataverse::new()).await;
        let account = f.service.connect_account(&f.owner, HOST, "secret").await.unwrap();
        let result = f.service.add_user_auth(&f.node, &f.owner, &account.id).await.unwrap();

        assert_eq!(result["result"]["nodeHasAuth"], true);
        assert_eq!(result["result"]["userIsOwner"], true);
        assert_eq!(result["result"]["host"], HOST);
        assert_eq!(node_actions(&f).await, vec![NODE_AUTHORIZED]);
    }

    #[tokio::test]
    async fn foreign_account_is_forbidden() {
        let f = fixture(ScriptedDataverse::new()).await;
        let account = f.service.connect_account(&f.owner, HOST, "secret").await.unwrap();
        let intruder = user("Intruder");
        f.store.save_user(&intruder).await.unwrap();

        let err = f
            .service
            .add_user_auth(&f.node, &intruder, &account.id)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 403);
        assert!(node_actions(&f).await.is_empty());
    }

    #[tokio::test]
    async fn dataset_id_is_resolved_once() {
        let f = authorized(ScriptedDataverse::new().with_dataset("42", DOI)).await;

        let settings = f.service.waterbutler_settings(&f.node).await.unwrap();
        assert_eq!(settings["host"], HOST);
        assert_eq!(settings["doi"], DOI);
        assert_eq!(settings["id"], "42");
        assert_eq!(settings["name"], "Dataset");

        f.service.waterbutler_settings(&f.node).await.unwrap();
        assert_eq!(f.api.call_count(), 1);

        let credentials = f.service.waterbutler_credentials(&f.node).await.unwrap();
        assert_eq!(credentials, json!({"token": "secret"}));
    }

    #[tokio::test]
    async fn unknown_doi_is_not_found() {
        let f = authorized(ScriptedDataverse::new().with_dataset("7", "doi:other")).await;
        assert!(matches!(
            f.service.waterbutler_settings(&f.node).await,
            Err(Error::NotFound { kind: "dataset", .. })
        ));
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let f = authorized(ScriptedDataverse::rejecting()).await;
        let err = f.service.waterbutler_settings(&f.node).await.unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[tokio::test]
    async fn remove_user_auth_clears_everything() {
        let f = authorized(ScriptedDataverse::new()).await;
        let result = f.service.remove_user_auth(&f.node, &f.owner).await.unwrap();
        assert_eq!(result["result"]["nodeHasAuth"], false);
        assert_eq!(result["result"]["hasDataset"], false);
        assert_eq!(result["result"]["userHasAuth"], true);

        let err = f.service.waterbutler_credentials(&f.node).await.unwrap_err();
        assert_eq!(err.to_string(), "Addon is not authorized");
        assert_eq!(
            node_actions(&f).await,
            vec![NODE_AUTHORIZED, "dataverse_node_deauthorized"]
        );
    }

    #[tokio::test]
    async fn waterbutler_log_is_persisted() {
        let f = authorized(ScriptedDataverse::new()).await;
        let log = f
            .service
            .create_waterbutler_log(
                &f.node,
                Some(&f.owner.id),
                "file_added",
                &json!({"path": "/123", "full_path": "/123?name=data.csv"}),
            )
            .await
            .unwrap();
        assert_eq!(log.action, "dataverse_file_added");
        assert_eq!(log.params["filename"], "data.csv");
        assert_eq!(node_actions(&f).await.last().unwrap(), "dataverse_file_added");
    }

    #[tokio::test]
    async fn fork_copies_auth_only_for_authorizer() {
        let f = authorized(ScriptedDataverse::new()).await;
        let fork = project("Fork");
        f.store.save_node(&fork).await.unwrap();

        let message = f
            .service
            .after_fork(&f.node, &fork, &f.owner.id)
            .await
            .unwrap()
            .unwrap();
        assert!(message.starts_with("Dataverse authorization copied"));
        let forked = f.store.dataverse_node_settings(&fork.id).await.unwrap().unwrap();
        assert!(forked.has_auth());
        assert_eq!(forked.dataset_doi.as_deref(), Some(DOI));

        let other = user("Other");
        let second = project("Second fork");
        f.store.save_node(&second).await.unwrap();
        f.service.after_fork(&f.node, &second, &other.id).await.unwrap();
        let forked = f.store.dataverse_node_settings(&second.id).await.unwrap().unwrap();
        assert!(!forked.has_auth());
    }

    #[tokio::test]
    async fn removing_authorizer_drops_auth() {
        let f = authorized(ScriptedDataverse::new()).await;
        let other = user("Other");
        assert!(f
            .service
            .after_remove_contributor(&f.node, &other, None)
            .await
            .unwrap()
            .is_none());

        let message = f
            .service
            .after_remove_contributor(&f.node, &f.owner, Some(&f.owner.id))
            .await
            .unwrap()
            .unwrap();
        assert!(message.contains("authentication information has been deleted"));
        assert!(!message.contains("re-authenticate"));
        let settings = f.store.dataverse_node_settings(&f.node.id).await.unwrap().unwrap();
        assert!(!settings.has_auth());
    }

    #[tokio::test]
    async fn delete_deauthorizes_with_log() {
        let f = authorized(ScriptedDataverse::new()).await;
        f.service.after_delete(&f.node, &f.owner.id).await.unwrap();
        let settings = f.store.dataverse_node_settings(&f.node.id).await.unwrap().unwrap();
        assert!(settings.dataset_doi.is_none());
        assert_eq!(node_actions(&f).await.last().unwrap(), "dataverse_node_deauthorized");
    }
}
