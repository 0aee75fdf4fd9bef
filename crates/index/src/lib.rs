//! SQLite index of imported titles.
//!
//! The index is the catalogue the rest of the pipeline consults: one
//! [`TitleRecord`] per imported game, keyed by an integer id and unique by
//! `stored_path`. It never touches the filesystem beyond its own database
//! file; whether a record's storage still exists is for the resolver to find
//! out.
//!
//! # Usage
//! ```no_run
//! # async fn demo() -> romshelf_index::error::Result<()> {
//! use romshelf_index::{Database, Repository};
//!
//! let db = Database::connect("/var/lib/romshelf/index.sqlite").await?;
//! let repo = Repository::from(&db);
//! for title in repo.list().await? {
//!     println!("{} [{}]", title.title, title.platform);
//! }
//! db.close().await;
//! # Ok(())
//! # }
//! ```

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{NewTitle, Placement, PlayStatus, TitleDetails, TitleId, TitleRecord};
pub use crate::repo::Repository;
