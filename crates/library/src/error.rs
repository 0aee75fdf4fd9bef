//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Each pipeline stage has its own `error` module; the
//! kinds here are what a stage's failure looks like from the outside.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The scan could not start (see the inner scan error).
    #[display("scan failed")]
    Scan,
    /// The pipeline context could not be built from configuration.
    #[display("invalid library context")]
    Context,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Scan => true,
            Self::Context => false,
        }
    }
}
