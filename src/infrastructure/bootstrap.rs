//! Composition root: turns a [`Config`] into ready-to-use services.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::outbound::dataverse::DataverseClient;
use crate::adapter::outbound::notifier::LogNotifier;
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations, DbPool};
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::addon::DataverseService;
use crate::application::group::GroupService;
use crate::application::schema::SchemaService;
use crate::domain::SiteUrls;
use crate::error::Result;
use crate::infrastructure::config::database::DatabaseConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::dataverse::DataverseApi;
use crate::port::outbound::notifier::NotifierRegistry;

/// Every service the CLI needs, sharing one store.
pub struct Services {
    pub store: Arc<SqliteStore>,
    pub schemas: SchemaService<SqliteStore>,
    pub groups: GroupService<SqliteStore>,
    pub dataverse: DataverseService<SqliteStore, dyn DataverseApi>,
    pub urls: SiteUrls,
}

/// Notifiers that are always on.
pub(crate) fn build_notifier_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Connection pool for the configured database, creating the file's
/// directory if needed.
///
/// # Errors
///
/// Returns an error if the directory or the pool cannot be created.
pub fn open_pool(config: &DatabaseConfig) -> Result<DbPool> {
    if !config.is_memory() {
        if let Some(parent) = Path::new(&config.url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    create_pool(&config.url, config.busy_timeout_ms)
}

/// Open the configured database.
///
/// With `migrate` set, pending migrations are applied first.
///
/// # Errors
///
/// Returns an error if the pool cannot be created or a migration fails.
pub fn open_store(config: &DatabaseConfig, migrate: bool) -> Result<SqliteStore> {
    let pool = open_pool(config)?;
    if migrate {
        let applied = run_migrations(&pool)?;
        if !applied.is_empty() {
            info!(count = applied.len(), "Applied database migrations");
        }
    }
    debug!(url = %config.url, "Database opened");
    Ok(SqliteStore::new(pool))
}

/// Build all services from configuration.
///
/// # Errors
///
/// Returns an error if the database or the HTTP client cannot be set up.
pub fn build_services(config: &Config) -> Result<Services> {
    let store = Arc::new(open_store(&config.database, true)?);
    let notifiers = Arc::new(build_notifier_registry());

    let client = DataverseClient::new(config.dataverse.timeout())?
        .with_scheme(config.dataverse.scheme.clone());
    let api: Arc<dyn DataverseApi> = Arc::new(client);

    Ok(Services {
        schemas: SchemaService::new(store.clone()),
        groups: GroupService::new(store.clone(), notifiers),
        dataverse: DataverseService::new(store.clone(), api),
        urls: config.site_urls(),
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::outbound::store::UserStore;
    use crate::testkit::domain::user;

    #[test]
    fn registry_always_logs() {
        assert_eq!(build_notifier_registry().len(), 1);
    }

    #[tokio::test]
    async fn services_share_a_migrated_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.url = dir
            .path()
            .join("nested/osfcore.db")
            .to_string_lossy()
            .into_owned();

        let services = build_services(&config).unwrap();
        let alice = user("Alice");
        services.store.save_user(&alice).await.unwrap();
        let group = services.groups.create("Lab", &alice).await.unwrap();
        assert_eq!(services.groups.group(&group.id).await.unwrap().name, "Lab");
        assert!(dir.path().join("nested/osfcore.db").exists());
    }
}
