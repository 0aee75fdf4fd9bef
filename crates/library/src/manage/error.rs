//! Error types for the [`manage`](super) module.

use derive_more::{Display, Error};
use romshelf_index::TitleId;
use std::path::PathBuf;

/// A management error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for management operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("no title with id {_0}")]
    NotFound(#[error(not(source))] TitleId),
    /// The destination file or stored path is already taken.
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// The requested change is not acceptable.
    #[display("invalid {_0}")]
    Invalid(#[error(not(source))] &'static str),
    #[display("filesystem error")]
    Io,
    #[display("index error")]
    Index,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Index)
    }
}
