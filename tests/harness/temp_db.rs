use std::path::{Path, PathBuf};
use std::sync::Arc;

use osfcore::adapter::outbound::sqlite::SqliteStore;
use osfcore::infrastructure::config::database::DatabaseConfig;
use osfcore::testkit::store::file_store;
use tempfile::TempDir;

/// Temporary SQLite database for integration tests.
///
/// The directory (and the database in it) is removed on drop.
pub struct TempDb {
    dir: TempDir,
    path: PathBuf,
    store: Arc<SqliteStore>,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("osfcore.db");
        let store = Arc::new(file_store(&path));
        Self { dir, path, store }
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.path.to_string_lossy().into_owned(),
            ..DatabaseConfig::default()
        }
    }

    /// Write a config file pointing at this database and return its path.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        let contents = format!(
            "[database]\nurl = {:?}\n\n[logging]\nlevel = \"warn\"\n{extra}",
            self.path.to_string_lossy()
        );
        std::fs::write(&path, contents).expect("write temp config");
        path
    }
}
