//! The managed storage root.
//!
//! Every filesystem mutation the library performs goes through
//! [`ManagedRoot`]: destinations are checked to lie below the root before
//! anything is written, nothing is ever overwritten, and removals refuse to
//! touch anything outside the root.

use crate::archive;
use crate::error::{ErrorKind, Result, map_io_error};
use crate::path::{is_within, sanitize_segment, validate as validate_path, validate_filename};
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};

/// Segment used when a platform label sanitises to nothing.
pub const FALLBACK_PLATFORM: &str = "Other";
/// Segment used when a title label sanitises to nothing.
pub const FALLBACK_TITLE: &str = "Untitled";

/// The directory tree owned by the importer.
///
/// Layout: `<root>/<sanitized platform>/<file or extracted title directory>`.
///
/// # Examples
///
/// ```no_run
/// use romshelf_storage::ManagedRoot;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = ManagedRoot::new("/srv/roms")?;
/// assert!(store.platform_dir("Super Nintendo").ends_with("Super_Nintendo"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ManagedRoot {
    /// Canonical (symlink-free) root directory
    root: PathBuf,
}

impl ManagedRoot {
    /// Open (creating if necessary) the managed root.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidPath`] if the path is not absolute or exists
    /// but is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it only happens once at startup and it's not
            // worth making the constructor async.
            sync_create_dir(&root).map_err(|e| map_io_error(e, &root))?;
        }
        let root = root.canonicalize().map_err(|e| map_io_error(e, &root))?;
        tracing::debug!(root = %root.display(), "Opened managed root");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// `<root>/<sanitized platform>`
    pub fn platform_dir(&self, platform: &str) -> PathBuf {
        self.root.join(sanitize_segment(platform, FALLBACK_PLATFORM))
    }

    /// `<root>/<sanitized platform>/<sanitized title>`
    pub fn title_dir(&self, platform: &str, title: &str) -> PathBuf {
        self.platform_dir(platform).join(sanitize_segment(title, FALLBACK_TITLE))
    }

    /// `<root>/<sanitized platform>/<filename>`; `filename` must be a plain
    /// file name with no directory components.
    pub fn file_destination(&self, platform: &str, filename: &str) -> Result<PathBuf> {
        Ok(self.platform_dir(platform).join(validate_filename(filename)?))
    }

    /// Lexical containment for paths that may not exist yet.
    fn ensure_destination(&self, path: &Path) -> Result<()> {
        let relative = path.strip_prefix(&self.root).map_err(|_| ErrorKind::OutsideRoot(path.to_path_buf()))?;
        let normalized = validate_path(relative).map_err(|_| ErrorKind::OutsideRoot(path.to_path_buf()))?;
        if normalized != relative {
            exn::bail!(ErrorKind::OutsideRoot(path.to_path_buf()));
        }
        Ok(())
    }

    /// Resolve symlinks and check that an *existing* path is the root or
    /// lies below it.
    ///
    /// # Errors
    /// [`ErrorKind::NotFound`] if `path` does not exist.
    pub async fn contains(&self, path: &Path) -> Result<bool> {
        let canonical = fs::canonicalize(path).await.map_err(|e| map_io_error(e, path))?;
        Ok(is_within(&self.root, &canonical))
    }

    /// Like [`contains`](Self::contains), but returns the canonical path and
    /// fails with [`ErrorKind::OutsideRoot`] when the check does not hold.
    pub async fn canonical_within(&self, path: &Path) -> Result<PathBuf> {
        let canonical = fs::canonicalize(path).await.map_err(|e| map_io_error(e, path))?;
        match is_within(&self.root, &canonical) {
            true => Ok(canonical),
            false => exn::bail!(ErrorKind::OutsideRoot(path.to_path_buf())),
        }
    }

    /// Create a directory (and parents) below the root.
    ///
    /// Returns `true` if the directory did not exist before.
    pub async fn create_dir(&self, path: &Path) -> Result<bool> {
        self.ensure_destination(path)?;
        let existed = fs::try_exists(path).await.map_err(|e| map_io_error(e, path))?;
        fs::create_dir_all(path).await.map_err(|e| map_io_error(e, path))?;
        Ok(!existed)
    }

    /// Copy `source` (anywhere on disk) to `dest` (below the root).
    ///
    /// Parent directories are created as needed. Fails with
    /// [`ErrorKind::AlreadyExists`] rather than overwriting; a partially
    /// written copy is removed. Returns the number of bytes copied.
    pub async fn copy_into(&self, source: &Path, dest: &Path) -> Result<u64> {
        self.ensure_destination(dest)?;
        let mut reader = fs::File::open(source).await.map_err(|e| map_io_error(e, source))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| map_io_error(e, parent))?;
        }
        let mut writer =
            OpenOptions::new().write(true).create_new(true).open(dest).await.map_err(|e| map_io_error(e, dest))?;
        match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(bytes) => {
                writer.sync_all().await.map_err(|e| map_io_error(e, dest))?;
                Ok(bytes)
            },
            Err(e) => {
                drop(writer);
                _ = fs::remove_file(dest).await;
                Err(map_io_error(e, dest).into())
            },
        }
    }

    /// Move `source` (anywhere on disk) to `dest` (below the root).
    ///
    /// Never overwrites. Falls back to copy-then-delete when the rename
    /// crosses filesystems.
    pub async fn move_into(&self, source: &Path, dest: &Path) -> Result<()> {
        self.ensure_destination(dest)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| map_io_error(e, parent))?;
        }
        self.relocate(source, dest).await
    }

    /// Move a file the library previously moved into the root back to where
    /// it came from. Used to compensate a failed import.
    pub async fn move_back(&self, placed: &Path, original: &Path) -> Result<()> {
        self.ensure_destination(placed)?;
        self.relocate(placed, original).await
    }

    /// Atomically put `staged` in place of the existing file `target`. Both
    /// must be below the root and on the same filesystem. This is the only
    /// operation that replaces a file, and only a regular file.
    pub async fn swap_in(&self, staged: &Path, target: &Path) -> Result<()> {
        self.ensure_destination(staged)?;
        self.ensure_destination(target)?;
        let metadata = fs::symlink_metadata(target).await.map_err(|e| map_io_error(e, target))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::InvalidPath(target.to_path_buf()));
        }
        fs::rename(staged, target).await.map_err(|e| map_io_error(e, staged))?;
        Ok(())
    }

    async fn relocate(&self, from: &Path, to: &Path) -> Result<()> {
        // `rename` silently replaces existing files on Unix.
        if fs::try_exists(to).await.map_err(|e| map_io_error(e, to))? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                tracing::debug!(from = %from.display(), to = %to.display(), "Rename crosses devices; copying instead");
                copy_then_remove(from, to).await
            },
            Err(e) => Err(map_io_error(e, from).into()),
        }
    }

    /// Extract a single archive member into `dest_dir` (below the root).
    pub async fn extract_into(&self, archive_path: &Path, entry: &str, dest_dir: &Path) -> Result<PathBuf> {
        self.ensure_destination(dest_dir)?;
        archive::extract_entry(archive_path, entry, dest_dir).await
    }

    /// Remove a file below the root. Refuses anything outside it.
    pub async fn remove_file(&self, path: &Path) -> Result<()> {
        let canonical = self.canonical_within(path).await?;
        fs::remove_file(&canonical).await.map_err(|e| map_io_error(e, path))?;
        Ok(())
    }

    /// Recursively remove a directory below the root. The root itself is
    /// never removed.
    pub async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let canonical = self.canonical_within(path).await?;
        if canonical == self.root {
            exn::bail!(ErrorKind::OutsideRoot(path.to_path_buf()));
        }
        fs::remove_dir_all(&canonical).await.map_err(|e| map_io_error(e, path))?;
        Ok(())
    }

    /// Remove whatever is at `path` (file or directory tree) below the root.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        let metadata = fs::symlink_metadata(path).await.map_err(|e| map_io_error(e, path))?;
        match metadata.is_dir() {
            true => self.remove_dir_all(path).await,
            false => self.remove_file(path).await,
        }
    }

    /// Remove now-empty directories from `start` upwards, stopping at (and
    /// never removing) `stop` or the root.
    pub async fn prune_empty_dirs(&self, start: &Path, stop: &Path) -> Result<()> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir == stop || dir == self.root || !dir.starts_with(stop) {
                break;
            }
            self.ensure_destination(dir)?;
            match fs::remove_dir(dir).await {
                Ok(()) => tracing::trace!(path = %dir.display(), "Pruned empty directory"),
                // Not empty (or already gone): nothing more to prune.
                Err(_) => break,
            }
            current = dir.parent();
        }
        Ok(())
    }
}

/// Rename fallback across filesystems. Whatever step fails, the copy at `to`
/// is deleted again, so the move either happens completely or not at all.
async fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    let mut reader = fs::File::open(from).await.map_err(|e| map_io_error(e, from))?;
    let mut writer =
        OpenOptions::new().write(true).create_new(true).open(to).await.map_err(|e| map_io_error(e, to))?;
    let copied = match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(_) => writer.sync_all().await.map_err(|e| map_io_error(e, to)),
        Err(e) => Err(map_io_error(e, to)),
    };
    drop(writer);
    let moved = match copied {
        Ok(()) => fs::remove_file(from).await.map_err(|e| map_io_error(e, from)),
        Err(kind) => Err(kind),
    };
    if let Err(kind) = moved {
        if let Err(e) = fs::remove_file(to).await {
            tracing::error!(path = %to.display(), error = %e, "Could not remove copy after a failed move");
        }
        exn::bail!(kind);
    }
    Ok(())
}
