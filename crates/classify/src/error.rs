//! Classifier Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A classifier error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for classifier operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Only raised while building a [`Classifier`](crate::Classifier) from an
/// extension table; classification itself is infallible.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The extension is empty (or only a dot) after normalisation.
    #[display("invalid extension: {_0:?}")]
    InvalidExtension(#[error(not(source))] String),
    /// The same extension appears twice in the table.
    #[display("duplicate extension in table: {_0}")]
    DuplicateExtension(#[error(not(source))] String),
    /// A playable extension is missing from the importable table.
    #[display("playable extension is not importable: {_0}")]
    NotImportable(#[error(not(source))] String),
    /// The requested archive format is not supported.
    #[display("unsupported archive format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::DuplicateExtension("nes".to_string()).to_string(), "duplicate extension in table: nes");
        assert_eq!(ErrorKind::InvalidExtension(".".to_string()).to_string(), "invalid extension: \".\"");
        assert!(!ErrorKind::NotImportable("txt".to_string()).is_retryable());
    }
}
