//! Error types for the [`scan`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a scan failure.
///
/// Only [`Index`](Self::Index) ends a scan; the others are reported against
/// the offending file and the walk continues.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading known stored paths from the index failed.
    #[display("could not read the title index")]
    Index,
    /// A filesystem entry could not be read.
    #[display("unreadable entry")]
    Storage,
    /// The archive is corrupt or not really an archive.
    #[display("unreadable archive: {}", _0.display())]
    BadArchive(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Index | Self::Storage)
    }
}
