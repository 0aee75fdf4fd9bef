//! Repository for [`TitleRecord`]s.
//!
//! Pure data access: no filesystem checks and no business rules beyond the
//! `stored_path` uniqueness constraint, which surfaces as
//! [`ErrorKind::AlreadyExists`].

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{NewTitle, Placement, TitleDetails, TitleId, TitleRecord, TitleRow};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

/// Handle for querying and mutating the title index.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

/// Map a failed statement, turning a `UNIQUE(stored_path)` violation into
/// [`ErrorKind::AlreadyExists`].
fn unique_path(err: sqlx::Error, stored_path: &Path) -> crate::error::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            exn::Exn::from(err).raise(ErrorKind::AlreadyExists(stored_path.to_path_buf()))
        },
        _ => exn::Exn::from(err).raise(ErrorKind::Database),
    }
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn path_text(path: &Path) -> Result<&str> {
        path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path is not valid UTF-8"))
    }

    fn year(details: &TitleDetails) -> Option<i64> {
        details.release_year.map(i64::from)
    }

    // ===== Insert =====

    /// Insert a new title, returning the persisted record.
    ///
    /// # Errors
    /// [`ErrorKind::AlreadyExists`] if another record already uses the same
    /// `stored_path`.
    pub async fn insert(&self, title: &NewTitle) -> Result<TitleRecord> {
        let stored_path = Self::path_text(&title.stored_path)?;
        let row: TitleRow = sqlx::query_as(include_str!("../queries/insert_title.sql"))
            .bind(&title.title)
            .bind(&title.platform)
            .bind(stored_path)
            .bind(&title.original_filename)
            .bind(title.placement.to_string())
            .bind(&title.details.genre)
            .bind(Self::year(&title.details))
            .bind(&title.details.developer)
            .bind(&title.details.publisher)
            .bind(&title.details.description)
            .bind(title.details.play_status.to_string())
            .bind(UtcDateTime::now().unix_timestamp())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_path(e, &title.stored_path))?;
        tracing::debug!(id = row.id, path = %title.stored_path.display(), "Inserted title");
        row.try_into()
    }

    // ===== Get/Fetch =====

    pub async fn get(&self, id: TitleId) -> Result<Option<TitleRecord>> {
        let row: Option<TitleRow> = sqlx::query_as(include_str!("../queries/get_by_id.sql"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(TitleRecord::try_from).transpose()
    }

    pub async fn get_by_stored_path(&self, path: impl AsRef<Path>) -> Result<Option<TitleRecord>> {
        let row: Option<TitleRow> = sqlx::query_as(include_str!("../queries/get_by_stored_path.sql"))
            .bind(Self::path_text(path.as_ref())?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(TitleRecord::try_from).transpose()
    }

    pub async fn stored_path_exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(include_str!("../queries/stored_path_exists.sql"))
            .bind(Self::path_text(path.as_ref())?)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists)
    }

    // ===== Listing =====

    /// Every stored path in the index, for bulk de-duplication during scans.
    pub async fn list_stored_paths(&self) -> Result<HashSet<PathBuf>> {
        let paths: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_stored_paths.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(paths.into_iter().map(PathBuf::from).collect())
    }

    /// All titles, ordered by platform then title.
    pub async fn list(&self) -> Result<Vec<TitleRecord>> {
        let rows: Vec<TitleRow> = sqlx::query_as(include_str!("../queries/list_titles.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(TitleRecord::try_from).collect()
    }

    pub async fn list_by_platform(&self, platform: impl AsRef<str>) -> Result<Vec<TitleRecord>> {
        let rows: Vec<TitleRow> = sqlx::query_as(include_str!("../queries/list_by_platform.sql"))
            .bind(platform.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(TitleRecord::try_from).collect()
    }

    pub async fn list_platforms(&self) -> Result<Vec<String>> {
        let platforms: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_platforms.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(platforms)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_titles.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }

    // ===== Update =====

    /// Replace the display metadata of a title.
    ///
    /// Returns `false` if no record has that id.
    pub async fn update_details(
        &self,
        id: TitleId,
        title: &str,
        platform: &str,
        details: &TitleDetails,
    ) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/update_details.sql"))
            .bind(title)
            .bind(platform)
            .bind(&details.genre)
            .bind(Self::year(details))
            .bind(&details.developer)
            .bind(&details.publisher)
            .bind(&details.description)
            .bind(details.play_status.to_string())
            .bind(id.get())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Point a title at different storage.
    ///
    /// Returns `false` if no record has that id.
    ///
    /// # Errors
    /// [`ErrorKind::AlreadyExists`] if another record already uses `stored_path`.
    pub async fn update_location(
        &self,
        id: TitleId,
        stored_path: &Path,
        original_filename: &str,
        placement: Placement,
    ) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/update_location.sql"))
            .bind(Self::path_text(stored_path)?)
            .bind(original_filename)
            .bind(placement.to_string())
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| unique_path(e, stored_path))?;
        Ok(result.rows_affected() > 0)
    }

    // ===== Delete =====

    /// Delete a title record. Backing files are the caller's concern.
    ///
    /// Returns `true` if a record was deleted.
    pub async fn delete(&self, id: TitleId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_title.sql"))
            .bind(id.get())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
