use diesel::prelude::*;

use super::{parse_timestamp, timestamp, Conn, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{
    DataverseNodeSettingsRow, DataverseUserAccountRow, DataverseUserSettingsRow,
    ExternalAccountRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    dataverse_node_settings, dataverse_user_accounts, dataverse_user_settings, external_accounts,
};
use crate::domain::{
    AccountId, DataverseNodeSettings, DataverseUserSettings, ExternalAccount, NodeId, SettingsId,
    UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::AddonStore;

fn account_from_row(row: ExternalAccountRow) -> Result<ExternalAccount> {
    Ok(ExternalAccount {
        id: AccountId::from(row.id),
        provider: row.provider,
        provider_id: row.provider_id,
        display_name: row.display_name,
        oauth_key: row.oauth_key,
        oauth_secret: row.oauth_secret,
        created: parse_timestamp(&row.created)?,
    })
}

fn load_account(conn: &mut Conn, id: &str) -> Result<Option<ExternalAccount>> {
    let row: Option<ExternalAccountRow> = external_accounts::table
        .find(id)
        .first(conn)
        .optional()?;
    row.map(account_from_row).transpose()
}

fn user_settings_from_row(
    conn: &mut Conn,
    row: DataverseUserSettingsRow,
) -> Result<DataverseUserSettings> {
    let account_ids: Vec<String> = dataverse_user_accounts::table
        .filter(dataverse_user_accounts::user_settings_id.eq(&row.id))
        .select(dataverse_user_accounts::account_id)
        .order(dataverse_user_accounts::account_id.asc())
        .load(conn)?;

    Ok(DataverseUserSettings {
        id: SettingsId::from(row.id),
        owner_id: UserId::from(row.owner_id),
        external_account_ids: account_ids.into_iter().map(AccountId::from).collect(),
        created: parse_timestamp(&row.created)?,
        modified: parse_timestamp(&row.modified)?,
    })
}

fn load_user_settings(
    conn: &mut Conn,
    filter_id: Option<&str>,
    owner: Option<&str>,
) -> Result<Option<DataverseUserSettings>> {
    let mut query = dataverse_user_settings::table
        .filter(dataverse_user_settings::deleted.eq(false))
        .into_boxed();
    if let Some(id) = filter_id {
        query = query.filter(dataverse_user_settings::id.eq(id.to_string()));
    }
    if let Some(owner) = owner {
        query = query.filter(dataverse_user_settings::owner_id.eq(owner.to_string()));
    }
    let row: Option<DataverseUserSettingsRow> = query.first(conn).optional()?;
    row.map(|row| user_settings_from_row(conn, row)).transpose()
}

impl AddonStore for SqliteStore {
    async fn save_external_account(&self, account: &ExternalAccount) -> Result<()> {
        let row = ExternalAccountRow {
            id: account.id.to_string(),
            provider: account.provider.clone(),
            provider_id: account.provider_id.clone(),
            display_name: account.display_name.clone(),
            oauth_key: account.oauth_key.clone(),
            oauth_secret: account.oauth_secret.clone(),
            created: timestamp(&account.created),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(external_accounts::table)
            .values(&row)
            .on_conflict(external_accounts::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn external_account(&self, id: &AccountId) -> Result<Option<ExternalAccount>> {
        let mut conn = self.conn()?;
        load_account(&mut *conn, id.as_str())
    }

    async fn external_account_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<ExternalAccount>> {
        let mut conn = self.conn()?;

        let row: Option<ExternalAccountRow> = external_accounts::table
            .filter(external_accounts::provider.eq(provider))
            .filter(external_accounts::provider_id.eq(provider_id))
            .first(&mut *conn)
            .optional()?;
        row.map(account_from_row).transpose()
    }

    async fn save_dataverse_user_settings(&self, settings: &DataverseUserSettings) -> Result<()> {
        let row = DataverseUserSettingsRow {
            id: settings.id.to_string(),
            owner_id: settings.owner_id.to_string(),
            deleted: false,
            created: timestamp(&settings.created),
            modified: timestamp(&settings.modified),
        };
        let links: Vec<DataverseUserAccountRow> = settings
            .external_account_ids
            .iter()
            .map(|account| DataverseUserAccountRow {
                user_settings_id: settings.id.to_string(),
                account_id: account.to_string(),
            })
            .collect();
        let mut conn = self.conn()?;

        conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(dataverse_user_settings::table)
                .values(&row)
                .on_conflict(dataverse_user_settings::id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            diesel::delete(
                dataverse_user_accounts::table
                    .filter(dataverse_user_accounts::user_settings_id.eq(&row.id)),
            )
            .execute(conn)?;
            diesel::insert_into(dataverse_user_accounts::table)
                .values(&links)
                .execute(conn)?;
            Ok(())
        })
    }

    async fn dataverse_user_settings(&self, owner: &UserId) -> Result<Option<DataverseUserSettings>> {
        let mut conn = self.conn()?;
        load_user_settings(&mut *conn, None, Some(owner.as_str()))
    }

    async fn save_dataverse_node_settings(&self, settings: &DataverseNodeSettings) -> Result<()> {
        let row = DataverseNodeSettingsRow {
            id: settings.id.to_string(),
            node_id: settings.node_id.to_string(),
            dataverse_alias: settings.dataverse_alias.clone(),
            dataverse: settings.dataverse.clone(),
            dataset_doi: settings.dataset_doi.clone(),
            dataset_id: settings.dataset_id.clone(),
            dataset: settings.dataset.clone(),
            user_settings_id: settings.user_settings.as_ref().map(|s| s.id.to_string()),
            external_account_id: settings.external_account.as_ref().map(|a| a.id.to_string()),
            deleted: false,
            created: timestamp(&settings.created),
            modified: timestamp(&settings.modified),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(dataverse_node_settings::table)
            .values(&row)
            .on_conflict(dataverse_node_settings::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn dataverse_node_settings(&self, node_id: &NodeId) -> Result<Option<DataverseNodeSettings>> {
        let mut conn = self.conn()?;

        let row: Option<DataverseNodeSettingsRow> = dataverse_node_settings::table
            .filter(dataverse_node_settings::node_id.eq(node_id.as_str()))
            .filter(dataverse_node_settings::deleted.eq(false))
            .first(&mut *conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let user_settings = match row.user_settings_id.as_deref() {
            Some(id) => load_user_settings(&mut *conn, Some(id), None)?,
            None => None,
        };
        let external_account = match row.external_account_id.as_deref() {
            Some(id) => load_account(&mut *conn, id)?,
            None => None,
        };

        Ok(Some(DataverseNodeSettings {
            id: SettingsId::from(row.id),
            node_id: NodeId::from(row.node_id),
            dataverse_alias: row.dataverse_alias,
            dataverse: row.dataverse,
            dataset_doi: row.dataset_doi,
            dataset_id: row.dataset_id,
            dataset: row.dataset,
            user_settings,
            external_account,
            created: parse_timestamp(&row.created)?,
            modified: parse_timestamp(&row.modified)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use diesel::connection::SimpleConnection;

    use crate::testkit::store::memory_store;
    use super::*;
    use crate::domain::addon::dataverse::SHORT_NAME;
    use crate::domain::{Node, User};
    use crate::port::outbound::store::{NodeStore, UserStore};

    #[tokio::test]
    async fn node_settings_load_with_account_and_user_settings() {
        let store = memory_store();
        let user = User::registered("Owner", "owner@example.com");
        let node = Node::new("Project");
        store.save_user(&user).await.unwrap();
        store.save_node(&node).await.unwrap();

        let account = ExternalAccount::new(SHORT_NAME, "secret", "demo.dataverse.org", "secret");
        store.save_external_account(&account).await.unwrap();
        assert_eq!(
            store
                .external_account_by_provider_id(SHORT_NAME, "secret")
                .await
                .unwrap()
                .map(|a| a.id),
            Some(account.id.clone())
        );
        assert!(store
            .external_account_by_provider_id(SHORT_NAME, "demo.dataverse.org")
            .await
            .unwrap()
            .is_none());
        let mut user_settings = DataverseUserSettings::new(user.id.clone());
        user_settings.external_account_ids.push(account.id.clone());
        store.save_dataverse_user_settings(&user_settings).await.unwrap();

        let mut settings = DataverseNodeSettings::new(node.id.clone());
        settings.set_auth(account.clone(), user_settings.clone()).unwrap();
        settings.set_dataset("alias", "Dataverse", "doi:10.5072/FK2/X", "Dataset");
        store.save_dataverse_node_settings(&settings).await.unwrap();

        let loaded = store.dataverse_node_settings(&node.id).await.unwrap().unwrap();
        assert!(loaded.complete());
        assert_eq!(loaded.external_account.as_ref().unwrap().oauth_secret, "secret");
        assert_eq!(loaded.user_settings.as_ref().unwrap().external_account_ids, vec![account.id]);
    }

    #[tokio::test]
    async fn clearing_fields_writes_nulls() {
        let store = memory_store();
        let user = User::registered("Owner", "owner@example.com");
        let node = Node::new("Project");
        store.save_user(&user).await.unwrap();
        store.save_node(&node).await.unwrap();

        let mut settings = DataverseNodeSettings::new(node.id.clone());
        settings.set_dataset("alias", "Dataverse", "doi:x", "Dataset");
        store.save_dataverse_node_settings(&settings).await.unwrap();
        settings.deauthorize(&node, Some(&user.id), false);
        store.save_dataverse_node_settings(&settings).await.unwrap();

        let loaded = store.dataverse_node_settings(&node.id).await.unwrap().unwrap();
        assert!(loaded.dataset_doi.is_none());
        assert!(loaded.dataverse_alias.is_none());
    }

    #[tokio::test]
    async fn legacy_rows_get_epoch_timestamps() {
        let store = memory_store();
        let user = User::registered("Owner", "owner@example.com");
        store.save_user(&user).await.unwrap();
        {
            let mut conn = store.conn().unwrap();
            conn.batch_execute(&format!(
                "INSERT INTO dataverse_user_settings (id, owner_id) VALUES ('legacy', '{}')",
                user.id
            ))
            .unwrap();
        }

        let loaded = store.dataverse_user_settings(&user.id).await.unwrap().unwrap();
        assert_eq!(loaded.created.timestamp(), 0);
        assert!(!loaded.has_auth());
    }
}
