use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::scan::error::{ErrorKind as ScanErrorKind, Result as ScanResult};
use crate::scan::{Candidate, inspect_file};
use crate::{Context, Diagnostic, destination_for};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use romshelf_index::Repository;
use romshelf_storage::error::ErrorKind as StorageErrorKind;
use romshelf_storage::{ManagedRoot, walk};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Progress events emitted by [`scan`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. One of [`Found`](Self::Found), [`Known`](Self::Known) or
///    [`Skipped`](Self::Skipped) per item of interest, in traversal order.
/// 3. [`Complete`](Self::Complete) exactly once.
///
/// If the index cannot be read before walking starts, the stream yields a
/// single `Err` after `Started` and ends without `Complete`.
#[derive(Debug)]
pub enum ScanEvent {
    Started,
    /// A new, importable candidate.
    Found(Candidate),
    /// An importable item whose stored path is already indexed.
    Known { path: PathBuf },
    /// An entry that could not be read, such as a corrupt archive.
    Skipped { path: PathBuf, diagnostic: Diagnostic },
    Complete(ScanSummary),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub found: u64,
    pub known: u64,
    pub skipped: u64,
}

/// Streams [`ScanEvent`]s for every file below `root`.
///
/// The stream is finite and can be restarted by calling `scan` again; it
/// cannot be resumed part way through. Stop polling it to cancel.
pub fn scan<'a>(
    store: &'a ManagedRoot,
    index: &'a Repository,
    ctx: &'a Context,
    root: impl AsRef<Path>,
) -> impl Stream<Item = LibraryResult<ScanEvent>> + 'a {
    let root = root.as_ref().to_path_buf();
    stream! {
        for await event in scan_inner(store, index, ctx, root) {
            yield event.or_raise(|| LibraryErrorKind::Scan);
        }
    }
}

/// Drain [`scan`] into the list of new candidates, discarding progress
/// events.
pub async fn collect_candidates(
    store: &ManagedRoot,
    index: &Repository,
    ctx: &Context,
    root: impl AsRef<Path>,
) -> LibraryResult<Vec<Candidate>> {
    let mut candidates = Vec::new();
    let events = scan(store, index, ctx, root);
    futures::pin_mut!(events);
    while let Some(event) = events.next().await {
        if let ScanEvent::Found(candidate) = event? {
            candidates.push(candidate);
        }
    }
    Ok(candidates)
}

/// Whether importing `candidate` would produce a stored path the index
/// already has. The source path is checked as well so that referenced
/// imports are recognised whatever the default policy is.
fn already_known(store: &ManagedRoot, ctx: &Context, known: &HashSet<PathBuf>, candidate: &Candidate) -> bool {
    if known.contains(&candidate.source_path) {
        return true;
    }
    destination_for(store, candidate, ctx.default_policy).is_ok_and(|destination| known.contains(&destination))
}

/// The path a walk error refers to, falling back to the scan root.
fn error_path(kind: &StorageErrorKind, root: &Path) -> PathBuf {
    match kind {
        StorageErrorKind::NotFound(p) | StorageErrorKind::PermissionDenied(p) | StorageErrorKind::InvalidPath(p) => {
            p.clone()
        },
        _ => root.to_path_buf(),
    }
}

fn scan_inner<'a>(
    store: &'a ManagedRoot,
    index: &'a Repository,
    ctx: &'a Context,
    root: PathBuf,
) -> impl Stream<Item = ScanResult<ScanEvent>> + 'a {
    stream!({
        yield Ok(ScanEvent::Started);

        let known = match index.list_stored_paths().await.or_raise(|| ScanErrorKind::Index) {
            Ok(known) => known,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Candidates carry absolute paths; a root that cannot be resolved is
        // left alone so the walk reports it.
        let root = tokio::fs::canonicalize(&root).await.unwrap_or(root);
        tracing::info!(root = %root.display(), indexed = known.len(), "Scanning");

        let mut summary = ScanSummary::default();
        let mut files = walk(&root);
        while let Some(file) = files.next().await {
            let file = match file {
                Ok(file) => file,
                Err(e) => {
                    summary.skipped += 1;
                    let path = error_path(&e, &root);
                    let diagnostic = Diagnostic::warning(format!("Skipping unreadable entry: {}", &*e));
                    yield Ok(ScanEvent::Skipped { path, diagnostic });
                    continue;
                },
            };
            match inspect_file(ctx, &file).await {
                Ok(Some(candidate)) if already_known(store, ctx, &known, &candidate) => {
                    tracing::debug!(path = %file.path.display(), "Already indexed");
                    summary.known += 1;
                    yield Ok(ScanEvent::Known { path: file.path });
                },
                Ok(Some(candidate)) => {
                    tracing::debug!(path = %file.path.display(), title = %candidate.title, platform = %candidate.platform, "Found candidate");
                    summary.found += 1;
                    yield Ok(ScanEvent::Found(candidate));
                },
                Ok(None) => tracing::trace!(path = %file.path.display(), "Not importable"),
                Err(e) => {
                    summary.skipped += 1;
                    let diagnostic = Diagnostic::warning(format!("Skipping {}: {}", file.path.display(), &*e));
                    yield Ok(ScanEvent::Skipped { path: file.path, diagnostic });
                },
            }
        }

        tracing::info!(found = summary.found, known = summary.known, skipped = summary.skipped, "Scan complete");
        yield Ok(ScanEvent::Complete(summary));
    })
}
