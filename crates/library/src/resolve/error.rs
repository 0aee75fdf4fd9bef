//! Error types for the [`resolve`](super) module.
//!
//! The HTTP boundary should map [`NotFound`](ErrorKind::NotFound) to a 404,
//! [`Forbidden`](ErrorKind::Forbidden) to a 403 and anything else to "cannot
//! serve". Display strings never contain paths, so they are safe to show to
//! an untrusted caller.

use derive_more::{Display, Error};

/// A resolution error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolve operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The record, its storage, or the requested file does not exist.
    #[display("not found")]
    NotFound,
    /// The resolved path lies outside the managed root.
    #[display("forbidden")]
    Forbidden,
    /// Unexpected filesystem failure.
    #[display("storage unavailable")]
    Io,
    /// The index could not be queried.
    #[display("index unavailable")]
    Index,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Index)
    }
}
