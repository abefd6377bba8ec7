//! Migrated SQLite stores.

use std::path::Path;

use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::sqlite::SqliteStore;

/// A fresh in-memory store with every migration applied.
pub fn memory_store() -> SqliteStore {
    let pool = create_pool(":memory:", 5000).expect("in-memory pool");
    run_migrations(&pool).expect("migrations");
    SqliteStore::new(pool)
}

/// A store backed by the database file at `path`, migrated.
pub fn file_store(path: &Path) -> SqliteStore {
    let url = path.to_string_lossy();
    let pool = create_pool(&url, 5000).expect("file pool");
    run_migrations(&pool).expect("migrations");
    SqliteStore::new(pool)
}
