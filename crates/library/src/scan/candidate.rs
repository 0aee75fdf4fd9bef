use romshelf_classify::Platform;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CandidateKind {
    /// The file on disk is the payload.
    SingleFile,
    /// The payload is one member of a zip archive, not yet extracted.
    Archive {
        /// Member name exactly as stored in the archive.
        entry: String,
    },
}

/// A not-yet-imported title discovered by the scanner.
///
/// `title` and `platform` are guesses; callers may edit them before import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path of the file or archive on disk.
    pub source_path: PathBuf,
    pub kind: CandidateKind,
    pub title: String,
    pub platform: Platform,
    /// Size on disk at scan time.
    pub size: u64,
}

impl Candidate {
    pub fn file(
        source_path: impl Into<PathBuf>,
        title: impl Into<String>,
        platform: impl Into<Platform>,
        size: u64,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            kind: CandidateKind::SingleFile,
            title: title.into(),
            platform: platform.into(),
            size,
        }
    }

    pub fn archive(
        source_path: impl Into<PathBuf>,
        entry: impl Into<String>,
        title: impl Into<String>,
        platform: impl Into<Platform>,
        size: u64,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            kind: CandidateKind::Archive { entry: entry.into() },
            title: title.into(),
            platform: platform.into(),
            size,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self.kind, CandidateKind::Archive { .. })
    }

    pub fn archive_entry(&self) -> Option<&str> {
        match &self.kind {
            CandidateKind::Archive { entry } => Some(entry),
            CandidateKind::SingleFile => None,
        }
    }

    /// File name of `source_path`.
    pub fn source_filename(&self) -> String {
        file_name(&self.source_path)
    }

    /// `source_path` without directory or extension; names the extraction
    /// directory of archive candidates.
    pub fn archive_stem(&self) -> String {
        self.source_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// The name users will see for the imported title's file: the source
    /// file name, or the archive member's base name.
    pub fn original_filename(&self) -> String {
        match &self.kind {
            CandidateKind::SingleFile => self.source_filename(),
            CandidateKind::Archive { entry } => entry.rsplit('/').next().unwrap_or(entry).to_string(),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_names() {
        let candidate = Candidate::file("/in/Tetris (World).gb", "Tetris", "Game Boy", 32);
        assert!(!candidate.is_archive());
        assert_eq!(candidate.archive_entry(), None);
        assert_eq!(candidate.original_filename(), "Tetris (World).gb");
        assert_eq!(candidate.source_filename(), "Tetris (World).gb");
    }

    #[test]
    fn test_archive_names() {
        let candidate = Candidate::archive("/in/pack.zip", "roms/usa/game.sfc", "Game", "Super Nintendo", 64);
        assert!(candidate.is_archive());
        assert_eq!(candidate.archive_entry(), Some("roms/usa/game.sfc"));
        assert_eq!(candidate.original_filename(), "game.sfc");
        assert_eq!(candidate.source_filename(), "pack.zip");
        assert_eq!(candidate.archive_stem(), "pack");
    }
}
