use crate::Context;
use crate::resolve::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use romshelf_index::{Repository, TitleId, TitleRecord};
use romshelf_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};
use romshelf_storage::{ManagedRoot, walk};
use std::path::{Path, PathBuf};

/// Exactly what to stream for a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServePlan {
    pub id: TitleId,
    /// Name to offer for downloads; the record's original file name.
    pub download_name: String,
    /// Canonical path of the file to stream. `None` for a directory with no
    /// playable member.
    pub actual_file: Option<PathBuf>,
    /// Canonical directory containing `actual_file` (or the stored directory
    /// itself). Always the managed root or below it.
    pub serving_directory: PathBuf,
    /// Whether `actual_file` can be handed to an in-browser emulator.
    pub playable: bool,
}

fn storage_failure(err: StorageError, id: TitleId) -> crate::resolve::error::Error {
    let kind = match &*err {
        StorageErrorKind::OutsideRoot(path) => {
            tracing::warn!(%id, path = %path.display(), "Refusing to serve a path outside the managed root");
            ErrorKind::Forbidden
        },
        StorageErrorKind::NotFound(_) => ErrorKind::NotFound,
        _ => ErrorKind::Io,
    };
    err.raise(kind)
}

/// Canonicalise `path` and check it is inside the managed root.
pub(crate) async fn contained(store: &ManagedRoot, path: &Path, id: TitleId) -> Result<PathBuf> {
    store.canonical_within(path).await.map_err(|e| storage_failure(e, id))
}

/// Best playable file below `dir`: lowest playable rank, then path order.
async fn find_playable(ctx: &Context, dir: &Path) -> Option<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;
    let mut files = walk(dir);
    while let Some(file) = files.next().await {
        let file = match file {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(error = %&*e, "Skipping unreadable entry while resolving");
                continue;
            },
        };
        let Some(rank) = ctx.classifier.playable_rank(&file.path) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((best_rank, best_path)) => (rank, &file.path) < (*best_rank, best_path),
        };
        if better {
            best = Some((rank, file.path));
        }
    }
    best.map(|(_, path)| path)
}

/// Turn a record into a [`ServePlan`].
///
/// - Directory: the best playable member, searched recursively. No playable
///   member gives a plan without a file.
/// - File: the file itself, playable if its extension is.
/// - Missing: [`ErrorKind::NotFound`]; the record is left alone.
///
/// Whatever the route, the file is canonicalised and its directory must be
/// inside the managed root, else [`ErrorKind::Forbidden`].
#[tracing::instrument(level = "debug", skip_all, fields(id = %record.id))]
pub async fn resolve(store: &ManagedRoot, ctx: &Context, record: &TitleRecord) -> Result<ServePlan> {
    let stored = record.stored_path.as_path();
    let metadata = match tokio::fs::metadata(stored).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(id = %record.id, path = %stored.display(), "Stored path has gone missing");
            exn::bail!(ErrorKind::NotFound);
        },
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
    };

    let (actual_file, serving_directory) = match metadata.is_dir() {
        true => match find_playable(ctx, stored).await {
            Some(file) => {
                let file = contained(store, &file, record.id).await?;
                let parent = file.parent().map(Path::to_path_buf).unwrap_or_else(|| file.clone());
                (Some(file), parent)
            },
            None => (None, stored.to_path_buf()),
        },
        false => {
            let file = tokio::fs::canonicalize(stored).await.or_raise(|| ErrorKind::Io)?;
            let parent = file.parent().map(Path::to_path_buf).unwrap_or_else(|| file.clone());
            (Some(file), parent)
        },
    };
    // Checked regardless of how the file was found.
    let serving_directory = contained(store, &serving_directory, record.id).await?;
    let playable = actual_file.as_ref().is_some_and(|file| ctx.classifier.is_playable_path(file));

    Ok(ServePlan {
        id: record.id,
        download_name: record.original_filename.clone(),
        actual_file,
        serving_directory,
        playable,
    })
}

/// Load a record by id and [`resolve`] it.
pub async fn resolve_by_id(store: &ManagedRoot, index: &Repository, ctx: &Context, id: TitleId) -> Result<ServePlan> {
    let record = index.get(id).await.or_raise(|| ErrorKind::Index)?;
    match record {
        Some(record) => resolve(store, ctx, &record).await,
        None => exn::bail!(ErrorKind::NotFound),
    }
}
