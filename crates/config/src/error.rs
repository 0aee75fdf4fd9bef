//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant is fatal at startup: fix the configuration and run again.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The config file extension is not one of toml, yaml/yml or json.
    #[display("unsupported config format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The merged sources could not be deserialised.
    #[display("invalid configuration")]
    Invalid,
    /// A path setting must be absolute.
    #[display("{key} must be an absolute path, got {}", path.display())]
    RelativePath { key: &'static str, path: PathBuf },
    /// No index path was configured and the platform has no data directory.
    #[display("cannot determine a default index location; set library.index")]
    NoDataDir,
    /// The classifier table in the configuration was rejected.
    #[display("invalid classifier table")]
    Classifier,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
