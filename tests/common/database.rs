//! Temp-file-backed database for integration tests.

use stock_analyzer::database::DatabaseManager;
use tempfile::TempDir;

/// A `DatabaseManager` over a throwaway SQLite file. The directory (and the
/// database in it) is removed when the struct drops.
pub struct TestDatabase {
    pub manager: DatabaseManager,
    _dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("test_stocks.db");
        let manager = DatabaseManager::new(path.to_str().expect("utf-8 temp path"))
            .await
            .expect("open test database");
        Self { manager, _dir: dir }
    }
}
