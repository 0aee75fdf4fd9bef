//! Recursive directory walking.

use crate::error::{ErrorKind, Result, map_io_error};
use crate::models::FileInfo;
use async_stream::stream;
use futures::{Stream, TryStreamExt};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};

pub type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

fn file_info(path: PathBuf, metadata: &Metadata) -> Result<FileInfo> {
    let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
    Ok(FileInfo::new(path, metadata.len(), modified))
}

/// Classify a single directory entry. Symlinks are followed only when they
/// point at a regular file; directory symlinks are never descended into.
async fn process_entry(entry: &DirEntry) -> Result<WalkEntry> {
    let path = entry.path();
    let file_type = entry.file_type().await.map_err(|e| map_io_error(e, &path))?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if file_type.is_file() {
        let metadata = entry.metadata().await.map_err(|e| map_io_error(e, &path))?;
        return Ok(WalkEntry::File(file_info(path, &metadata)?));
    }
    if file_type.is_symlink() {
        return match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(WalkEntry::File(file_info(path, &metadata)?)),
            Ok(_) => Ok(WalkEntry::Skip),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Skipping broken symlink");
                Ok(WalkEntry::Skip)
            },
            Err(e) => Err(map_io_error(e, &path).into()),
        };
    }
    Ok(WalkEntry::Skip)
}

/// Stream every regular file below `root`, depth-first.
///
/// Entries within a directory are visited in file-name order, files before
/// subdirectories, so repeated walks of an unchanged tree yield the same
/// sequence. Unreadable entries and directories are yielded as `Err` items
/// and the walk carries on; only a missing or unreadable `root` ends the
/// stream after its single error.
pub fn walk(root: &Path) -> FileInfoStream<'_> {
    let mut stack = vec![root.to_path_buf()];
    Box::pin(stream! {
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                // Subdirectory removed mid-walk; nothing to report.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound && current != root => continue 'dirs,
                Err(err) => {
                    yield Err(exn::Exn::from(map_io_error(err, &current)));
                    continue 'dirs;
                },
            };

            let mut listed = Vec::new();
            'entries: loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => listed.push(entry),
                    Ok(None) => break 'entries,
                    Err(e) => {
                        yield Err(exn::Exn::from(map_io_error(e, &current)));
                        break 'entries;
                    },
                }
            }
            listed.sort_by_key(|entry| entry.file_name());

            let mut descend = Vec::new();
            for entry in listed {
                match process_entry(&entry).await {
                    Ok(WalkEntry::File(f)) => yield Ok(f),
                    Ok(WalkEntry::Descend(d)) => descend.push(d),
                    Ok(WalkEntry::Skip) => {},
                    Err(e) => yield Err(e),
                }
            }
            // Reversed so the stack pops subdirectories in name order.
            stack.extend(descend.into_iter().rev());
        }
    })
}

/// Collect all files below `root`, failing on the first error.
pub async fn list(root: &Path) -> Result<Vec<FileInfo>> {
    walk(root).try_collect().await
}
