use crate::Diagnostic;
use crate::import::error::ErrorKind;
use derive_more::Display;
use romshelf_index::TitleRecord;
use std::path::PathBuf;

/// Why a single candidate failed to import.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Destination file or stored path already taken; nothing was overwritten.
    #[display("already exists")]
    AlreadyExists,
    /// Permission, disk or missing-source problems.
    #[display("I/O error")]
    Io,
    /// The archive could not be read.
    #[display("bad archive")]
    BadArchive,
    /// The index failed for a reason other than a duplicate stored path.
    #[display("index error")]
    Index,
}
impl From<&ErrorKind> for FailureKind {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::AlreadyExists(_) => Self::AlreadyExists,
            ErrorKind::Io | ErrorKind::RelativeSource(_) => Self::Io,
            ErrorKind::BadArchive(_) => Self::BadArchive,
            ErrorKind::Index => Self::Index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportStatus {
    Imported(TitleRecord),
    Failed(FailureKind),
}

/// Per-candidate result of an import. A batch may partially succeed; each
/// outcome is the truth for its own candidate only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOutcome {
    pub source_path: PathBuf,
    pub status: ImportStatus,
    pub diagnostics: Vec<Diagnostic>,
}
impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ImportStatus::Imported(_))
    }

    pub fn error_kind(&self) -> Option<FailureKind> {
        match self.status {
            ImportStatus::Imported(_) => None,
            ImportStatus::Failed(kind) => Some(kind),
        }
    }

    pub fn record(&self) -> Option<&TitleRecord> {
        match &self.status {
            ImportStatus::Imported(record) => Some(record),
            ImportStatus::Failed(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u64,
    pub failed: u64,
}
