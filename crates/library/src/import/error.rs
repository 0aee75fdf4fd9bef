//! Error types for the [`import`](super) module.
//!
//! These never escape the module as errors: [`import_candidate`](super::import_candidate)
//! folds them into an [`ImportOutcome`](super::ImportOutcome) so that one bad
//! item cannot abort a batch.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An import error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The destination file or the stored path is already taken.
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Reading the source or writing the destination failed.
    #[display("filesystem error")]
    Io,
    /// The archive is unreadable or lacks the chosen member.
    #[display("unreadable archive: {}", _0.display())]
    BadArchive(#[error(not(source))] PathBuf),
    /// Referenced files must be given by absolute path.
    #[display("source path is not absolute: {}", _0.display())]
    RelativeSource(#[error(not(source))] PathBuf),
    /// The index rejected the record for a reason other than a duplicate path.
    #[display("could not record the title in the index")]
    Index,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Index)
    }
}
