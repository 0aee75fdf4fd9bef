use crate::import::error::{Error, ErrorKind, Result};
use crate::import::{FailureKind, ImportOutcome, ImportStatus};
use crate::scan::{Candidate, CandidateKind};
use crate::{Diagnostic, PlacementPolicy, destination_for};
use exn::ResultExt;
use romshelf_index::error::ErrorKind as IndexErrorKind;
use romshelf_index::{NewTitle, Placement, Repository, TitleDetails, TitleRecord};
use romshelf_storage::ManagedRoot;
use romshelf_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind, Result as StorageResult};
use std::path::{Path, PathBuf};

/// What the filesystem step did, so it can be undone.
enum Placed {
    Referenced,
    Copied(PathBuf),
    Moved { placed: PathBuf, original: PathBuf },
    Extracted { file: PathBuf, dir: PathBuf, created_dir: bool },
}

impl Placed {
    fn placement(&self) -> Placement {
        match self {
            Self::Referenced => Placement::Reference,
            Self::Copied(_) => Placement::Copy,
            Self::Moved { .. } => Placement::Move,
            Self::Extracted { .. } => Placement::Extract,
        }
    }

    async fn rollback(&self, store: &ManagedRoot) -> StorageResult<()> {
        let removed = match self {
            Self::Referenced => return Ok(()),
            Self::Copied(path) => {
                store.remove_file(path).await?;
                path
            },
            Self::Moved { placed, original } => {
                store.move_back(placed, original).await?;
                placed
            },
            Self::Extracted { dir, created_dir: true, .. } => {
                store.remove_dir_all(dir).await?;
                dir
            },
            Self::Extracted { file, dir, created_dir: false } => {
                store.remove_file(file).await?;
                return match file.parent() {
                    Some(parent) => store.prune_empty_dirs(parent, dir).await,
                    None => Ok(()),
                };
            },
        };
        // Platform directories created for this import only.
        match removed.parent() {
            Some(parent) => store.prune_empty_dirs(parent, store.path()).await,
            None => Ok(()),
        }
    }
}

fn storage_failure(err: StorageError, source: &Path) -> Error {
    let kind = match &*err {
        StorageErrorKind::AlreadyExists(path) => ErrorKind::AlreadyExists(path.clone()),
        StorageErrorKind::BadArchive(_) | StorageErrorKind::EntryNotFound(_) => {
            ErrorKind::BadArchive(source.to_path_buf())
        },
        _ => ErrorKind::Io,
    };
    err.raise(kind)
}

async fn place(
    store: &ManagedRoot,
    candidate: &Candidate,
    policy: PlacementPolicy,
    destination: &Path,
) -> Result<Placed> {
    let source = candidate.source_path.as_path();
    let destination = destination.to_path_buf();
    match (&candidate.kind, policy) {
        (CandidateKind::Archive { entry }, _) => {
            let created_dir = store.create_dir(&destination).await.map_err(|e| storage_failure(e, source))?;
            match store.extract_into(source, entry, &destination).await {
                Ok(file) => Ok(Placed::Extracted { file, dir: destination, created_dir }),
                Err(e) => {
                    if created_dir && store.remove_dir_all(&destination).await.is_ok()
                        && let Some(parent) = destination.parent()
                    {
                        _ = store.prune_empty_dirs(parent, store.path()).await;
                    }
                    Err(storage_failure(e, source))
                },
            }
        },
        (CandidateKind::SingleFile, PlacementPolicy::Copy) => {
            store.copy_into(source, &destination).await.map_err(|e| storage_failure(e, source))?;
            Ok(Placed::Copied(destination))
        },
        (CandidateKind::SingleFile, PlacementPolicy::Move) => {
            store.move_into(source, &destination).await.map_err(|e| storage_failure(e, source))?;
            Ok(Placed::Moved { placed: destination, original: source.to_path_buf() })
        },
        (CandidateKind::SingleFile, PlacementPolicy::ReferenceInPlace) => {
            if !source.is_absolute() {
                exn::bail!(ErrorKind::RelativeSource(source.to_path_buf()));
            }
            let metadata = tokio::fs::metadata(source).await.or_raise(|| ErrorKind::Io)?;
            if !metadata.is_file() {
                exn::bail!(ErrorKind::Io);
            }
            Ok(Placed::Referenced)
        },
    }
}

async fn import_inner(
    store: &ManagedRoot,
    index: &Repository,
    candidate: &Candidate,
    policy: PlacementPolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<TitleRecord> {
    let destination = destination_for(store, candidate, policy).map_err(|e| storage_failure(e, &candidate.source_path))?;
    let placed = place(store, candidate, policy, &destination).await?;
    let title = NewTitle {
        title: candidate.title.clone(),
        platform: candidate.platform.to_string(),
        stored_path: destination,
        original_filename: candidate.original_filename(),
        placement: placed.placement(),
        details: TitleDetails::default(),
    };
    match index.insert(&title).await {
        Ok(record) => Ok(record),
        Err(e) => {
            // No transaction spans the filesystem and the index; undo by hand.
            match placed.rollback(store).await {
                Ok(()) => tracing::debug!(path = %title.stored_path.display(), "Rolled back placement"),
                Err(rollback) => diagnostics.push(Diagnostic::error(format!(
                    "Could not roll back {}: {}",
                    title.stored_path.display(),
                    &*rollback
                ))),
            }
            let kind = match &*e {
                IndexErrorKind::AlreadyExists(path) => ErrorKind::AlreadyExists(path.clone()),
                _ => ErrorKind::Index,
            };
            Err(e.raise(kind))
        },
    }
}

/// Import a single candidate under `policy`.
///
/// Never fails as a whole: problems are reported in the returned
/// [`ImportOutcome`] as a [`FailureKind`] plus diagnostics. When the index
/// refuses the record, the file that was just copied, moved or extracted is
/// removed (or moved back) so no orphaned storage is left behind.
#[tracing::instrument(level = "debug", skip_all, fields(source = %candidate.source_path.display(), policy = %policy))]
pub async fn import_candidate(
    store: &ManagedRoot,
    index: &Repository,
    candidate: &Candidate,
    policy: PlacementPolicy,
) -> ImportOutcome {
    let mut diagnostics = Vec::new();
    let status = match import_inner(store, index, candidate, policy, &mut diagnostics).await {
        Ok(record) => {
            diagnostics.push(Diagnostic::info(format!(
                "Imported {} [{}] as #{} ({})",
                record.title, record.platform, record.id, record.placement
            )));
            ImportStatus::Imported(record)
        },
        Err(e) => {
            let kind = FailureKind::from(&*e);
            diagnostics.push(Diagnostic::error(format!(
                "Failed to import {}: {}",
                candidate.source_path.display(),
                &*e
            )));
            ImportStatus::Failed(kind)
        },
    };
    ImportOutcome { source_path: candidate.source_path.clone(), status, diagnostics }
}
