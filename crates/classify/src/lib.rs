//! Platform classification for game files.
//!
//! This crate maps file extensions to platform labels through a single,
//! data-driven [`Classifier`]. The same table answers three questions:
//!
//! - **Which platform?** ([`Classifier::classify`], [`Classifier::platform_for`])
//! - **Can it be imported?** ([`Classifier::is_importable`])
//! - **Can it be embedded in a constrained runtime?** ([`Classifier::is_playable`])
//!
//! Table order doubles as preference order: when an archive holds several
//! importable members, [`Classifier::pick_primary`] chooses the one whose
//! extension appears first, so cartridge images win over generic binaries and
//! companion files (manuals, saves) are never picked.
//!
//! Archive containers are detected separately via [`ArchiveFormat`].

mod archive;
pub mod error;
mod table;

pub use crate::archive::ArchiveFormat;
pub use crate::table::{BUILTIN_PLAYABLE, BUILTIN_TABLE, Classifier, ExtensionRule};
use derive_more::Display;
use std::path::Path;

const OTHER: &str = "Other";

/// A platform display label, such as `"Super Nintendo"`.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{_0}")]
pub struct Platform(String);
impl Platform {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Fallback label for anything the table does not recognise.
    pub fn other() -> Self {
        Self(OTHER.to_string())
    }

    pub fn is_other(&self) -> bool {
        self.0 == OTHER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for Platform {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}
impl From<String> for Platform {
    fn from(label: String) -> Self {
        Self(label)
    }
}
impl AsRef<str> for Platform {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of looking an extension up in the [`Classifier`] table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Known(Platform),
    Unknown,
}
impl Classification {
    /// Collapse into a platform, mapping [`Unknown`](Self::Unknown) to
    /// [`Platform::other`].
    pub fn into_platform(self) -> Platform {
        match self {
            Self::Known(platform) => platform,
            Self::Unknown => Platform::other(),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Normalise an extension for table lookups: trimmed, leading dot removed and
/// ASCII-lowercased. Returns `None` when nothing is left.
pub fn normalize_extension(extension: &str) -> Option<String> {
    let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    match normalized.is_empty() {
        true => None,
        false => Some(normalized),
    }
}

/// Lowercase extension of a path (or an archive member name), without the dot.
///
/// Dotfiles such as `.nes` have no extension, matching [`Path::extension`].
pub fn extension_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref().extension().and_then(|ext| ext.to_str()).and_then(normalize_extension)
}
