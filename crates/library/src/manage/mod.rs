//! Changes to titles after import.
//!
//! - [`edit_title`] updates display metadata only.
//! - [`replace_file`] swaps a title's payload for a new file.
//! - [`delete_title`] removes a record together with the storage it owns.
//!
//! A record owns its storage when it was copied, moved or extracted by the
//! importer *and* the stored path is inside the managed root. Referenced
//! files are never touched.

mod delete;
mod edit;
pub mod error;
mod replace;

pub use self::delete::{Backing, DeleteOutcome, delete_title};
pub use self::edit::{TitleEdit, edit_title};
pub use self::replace::replace_file;

use romshelf_index::TitleRecord;
use romshelf_storage::ManagedRoot;

async fn owns_storage(store: &ManagedRoot, record: &TitleRecord) -> bool {
    record.placement.owns_storage() && store.contains(&record.stored_path).await.unwrap_or(false)
}
