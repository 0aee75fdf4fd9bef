use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::path::PathBuf;
use std::str::FromStr;
use time::UtcDateTime;

/// Surrogate key of a [`TitleRecord`], assigned by the index on insert.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{_0}")]
pub struct TitleId(i64);
impl TitleId {
    pub fn get(self) -> i64 {
        self.0
    }
}
impl From<i64> for TitleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// How a record's storage was produced.
///
/// Only [`Reference`](Self::Reference) records point at files the library
/// does not own; everything else was written into the managed root by the
/// importer.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Placement {
    #[display("copy")]
    Copy,
    #[display("move")]
    Move,
    #[display("extract")]
    Extract,
    #[display("reference")]
    Reference,
}
impl Placement {
    /// Whether deleting the record may delete its backing storage.
    pub fn owns_storage(&self) -> bool {
        !matches!(self, Self::Reference)
    }
}
impl FromStr for Placement {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            "extract" => Ok(Self::Extract),
            "reference" => Ok(Self::Reference),
            _ => exn::bail!(ErrorKind::InvalidData("placement")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum PlayStatus {
    #[default]
    #[display("not_played")]
    NotPlayed,
    #[display("playing")]
    Playing,
    #[display("completed")]
    Completed,
    #[display("abandoned")]
    Abandoned,
}
impl FromStr for PlayStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "not_played" => Ok(Self::NotPlayed),
            "playing" => Ok(Self::Playing),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => exn::bail!(ErrorKind::InvalidData("play status")),
        }
    }
}

/// Optional, user-editable metadata. Never fetched from external services.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TitleDetails {
    pub genre: Option<String>,
    pub release_year: Option<u16>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub play_status: PlayStatus,
}

/// A title about to be inserted; the index assigns the id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTitle {
    pub title: String,
    pub platform: String,
    pub stored_path: PathBuf,
    pub original_filename: String,
    pub placement: Placement,
    pub details: TitleDetails,
}

/// A persisted title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleRecord {
    pub id: TitleId,
    pub title: String,
    pub platform: String,
    /// Absolute path below the managed root, or the original path for
    /// [`Placement::Reference`] records. Unique across the index.
    pub stored_path: PathBuf,
    pub original_filename: String,
    pub placement: Placement,
    pub details: TitleDetails,
    pub imported_at: UtcDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Placement::Copy)]
    #[case(Placement::Move)]
    #[case(Placement::Extract)]
    #[case(Placement::Reference)]
    fn test_placement_text(#[case] placement: Placement) {
        assert_eq!(placement.to_string().parse::<Placement>().unwrap(), placement);
    }

    #[test]
    fn test_only_references_are_unowned() {
        assert!(Placement::Copy.owns_storage());
        assert!(Placement::Extract.owns_storage());
        assert!(!Placement::Reference.owns_storage());
    }

    #[rstest]
    #[case("not_played", PlayStatus::NotPlayed)]
    #[case("Not Played", PlayStatus::NotPlayed)]
    #[case("PLAYING", PlayStatus::Playing)]
    #[case("completed", PlayStatus::Completed)]
    #[case("abandoned", PlayStatus::Abandoned)]
    fn test_play_status_from_str(#[case] input: &str, #[case] expected: PlayStatus) {
        assert_eq!(input.parse::<PlayStatus>().unwrap(), expected);
    }

    #[test]
    fn test_play_status_rejects_unknown() {
        assert!("beaten".parse::<PlayStatus>().is_err());
        assert!("".parse::<Placement>().is_err());
    }
}
