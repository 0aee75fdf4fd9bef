//! Storage models.

use romshelf_classify::ArchiveFormat;
use std::path::PathBuf;
use time::OffsetDateTime;

/// Metadata for a regular file found while walking a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Absolute path of the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
    /// Archive container detected from the file extension, if any
    pub archive: Option<ArchiveFormat>,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        let path = path.into();
        let archive = ArchiveFormat::from_path(&path);
        Self { path, size, modified, archive }
    }
}

/// A member listed in an archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name exactly as stored in the archive (forward slashes).
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    pub is_dir: bool,
}
