use crate::manage::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use romshelf_index::{Repository, TitleId, TitleRecord};
use romshelf_storage::ManagedRoot;
use romshelf_storage::error::ErrorKind as StorageErrorKind;

/// What happened to the storage behind a deleted record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backing {
    /// Owned storage was removed.
    Removed,
    /// The record referenced a file it did not own, or one outside the
    /// managed root; the file was left in place.
    Kept,
    /// Nothing was on disk any more.
    AlreadyMissing,
}

#[derive(Clone, Debug)]
pub struct DeleteOutcome {
    pub record: TitleRecord,
    pub backing: Backing,
}

async fn remove_backing(store: &ManagedRoot, record: &TitleRecord) -> Result<Backing> {
    if !record.placement.owns_storage() {
        return Ok(Backing::Kept);
    }
    let path = record.stored_path.as_path();
    match store.contains(path).await {
        Ok(true) => {},
        Ok(false) => {
            tracing::warn!(id = %record.id, path = %path.display(), "Not removing storage outside the managed root");
            return Ok(Backing::Kept);
        },
        Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => return Ok(Backing::AlreadyMissing),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
    }
    match store.remove(path).await {
        Ok(()) => {},
        Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => return Ok(Backing::AlreadyMissing),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
    }
    if let Some(parent) = path.parent()
        && let Err(e) = store.prune_empty_dirs(parent, store.path()).await
    {
        tracing::debug!(path = %parent.display(), error = %&*e, "Could not prune empty directories");
    }
    Ok(Backing::Removed)
}

/// Delete a title and the storage it owns.
///
/// Storage goes first: if it cannot be removed the record stays, so nothing
/// is orphaned on disk. Referenced files are never removed.
#[tracing::instrument(level = "debug", skip(store, index))]
pub async fn delete_title(store: &ManagedRoot, index: &Repository, id: TitleId) -> Result<DeleteOutcome> {
    let record = index.get(id).await.or_raise(|| ErrorKind::Index)?.ok_or_raise(|| ErrorKind::NotFound(id))?;
    let backing = remove_backing(store, &record).await?;
    if !index.delete(id).await.or_raise(|| ErrorKind::Index)? {
        exn::bail!(ErrorKind::NotFound(id));
    }
    tracing::info!(%id, title = %record.title, ?backing, "Deleted title");
    Ok(DeleteOutcome { record, backing })
}
