//! Opening the index and keeping its schema current.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
/// One writer (the importer) plus a few concurrent readers such as a server
/// resolving titles.
const POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// A pool of connections to the title index.
///
/// Build a [`Repository`](crate::Repository) from it for queries.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the index file at `path` and bring its
    /// schema up to date. Missing parent directories are created.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        tracing::debug!(path = %path.display(), "Opening title index");
        let options = Self::options().filename(path).create_if_missing(true);
        Self::open(options, POOL_SIZE).await
    }

    /// A throwaway index that lives as long as the returned value.
    ///
    /// Public so that other crates can use it in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every connection to `:memory:` is its own database, so the pool
        // must never open a second one.
        Self::open(Self::options().filename(":memory:"), 1).await
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
    }

    async fn open(options: SqliteConnectOptions, size: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(size)
            .after_connect(|conn, _| Box::pin(Self::tune(conn)))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Per-connection settings with no [`SqliteConnectOptions`] builder.
    async fn tune(conn: &mut SqliteConnection) -> sqlx::Result<()> {
        sqlx::query("PRAGMA temp_store = MEMORY; PRAGMA cache_size = -2048;").execute(conn).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for outstanding queries, then close every connection.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_lifecycle() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_schema_has_unique_stored_path() {
        let db = Database::connect_in_memory().await.unwrap();
        // Running again is a no-op.
        db.migrate().await.unwrap();
        let sql: String = sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'titles'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(sql.contains("stored_path") && sql.contains("UNIQUE"));
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_creates_parent_directories() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/dir/library.db");
        let db = Database::connect(&path).await.unwrap();
        assert!(path.exists());
        db.close().await;
    }
}
