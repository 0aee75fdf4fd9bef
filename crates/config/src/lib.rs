//! Layered configuration for romshelf.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults,
//! 2. a config file (TOML, YAML or JSON, picked by extension),
//! 3. `ROMSHELF_*` environment variables, with `__` separating nested keys
//!    (`ROMSHELF_LIBRARY__ROOT=/srv/roms`).
//!
//! ```toml
//! [library]
//! root = "/srv/roms"
//! default_placement = "move"
//!
//! [classifier]
//! playable = ["nes"]
//! [[classifier.extensions]]
//! extension = "nes"
//! platform = "Nintendo Entertainment System"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use romshelf_classify::{BUILTIN_PLAYABLE, BUILTIN_TABLE, Classifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ENV_PREFIX: &str = "ROMSHELF_";
const CONFIG_FILENAME: &str = "romshelf.toml";
const INDEX_FILENAME: &str = "library.db";

/// How the importer places loose files.
///
/// Archives are always extracted into the managed root regardless of the
/// policy.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementPolicy {
    #[default]
    #[display("copy")]
    Copy,
    #[display("move")]
    Move,
    /// Record the file where it is, without touching it.
    #[display("reference")]
    #[serde(rename = "reference", alias = "reference_in_place")]
    ReferenceInPlace,
}
impl FromStr for PlacementPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            "reference" | "reference_in_place" => Ok(Self::ReferenceInPlace),
            other => Err(format!("unknown placement policy {other:?} (expected copy, move or reference)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Managed root that copies, moves and extractions are written below.
    pub root: PathBuf,
    /// SQLite index file; defaults to the platform data directory.
    #[serde(default)]
    pub index: Option<PathBuf>,
    /// Placement used by scan de-duplication and by imports without an
    /// explicit policy.
    #[serde(default)]
    pub default_placement: PlacementPolicy,
}

/// Overrides for the classifier table. Empty means "use the built-in table".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
    #[serde(default)]
    pub playable: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub extension: String,
    pub platform: String,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "romshelf")
}

/// Where `load(None)` looks for a config file.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

fn file_figment(path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    let figment = Figment::new();
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

impl Config {
    /// Load configuration from `path` (which must exist), or from the
    /// default location if it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let figment = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => file_figment(path)?,
            None => match default_config_path() {
                Some(default) if default.is_file() => file_figment(&default)?,
                _ => Figment::new(),
            },
        };
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from an assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid)?;
        config.validate()?;
        tracing::debug!(root = %config.library.root.display(), policy = %config.library.default_placement, "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.library.root.is_absolute() {
            exn::bail!(ErrorKind::RelativePath { key: "library.root", path: self.library.root.clone() });
        }
        if let Some(index) = &self.library.index
            && !index.is_absolute()
        {
            exn::bail!(ErrorKind::RelativePath { key: "library.index", path: index.clone() });
        }
        Ok(())
    }

    /// The configured index path, or `<data dir>/library.db`.
    pub fn index_path(&self) -> Result<PathBuf> {
        if let Some(index) = &self.library.index {
            return Ok(index.clone());
        }
        project_dirs().map(|dirs| dirs.data_dir().join(INDEX_FILENAME)).ok_or_raise(|| ErrorKind::NoDataDir)
    }

    /// Build the classifier described by the `[classifier]` section.
    ///
    /// Without a custom table the built-in one is used. Without a custom
    /// playable list, the built-in playable extensions that the table knows
    /// are kept.
    pub fn classifier(&self) -> Result<Classifier> {
        let custom = &self.classifier;
        if custom.extensions.is_empty() && custom.playable.is_none() {
            return Ok(Classifier::default());
        }
        let rules: Vec<(String, String)> = if custom.extensions.is_empty() {
            BUILTIN_TABLE.iter().map(|(e, p)| ((*e).to_string(), (*p).to_string())).collect()
        } else {
            custom.extensions.iter().map(|e| (e.extension.clone(), e.platform.clone())).collect()
        };
        let playable: Vec<String> = match &custom.playable {
            Some(playable) => playable.clone(),
            None => BUILTIN_PLAYABLE
                .iter()
                .filter(|ext| rules.iter().any(|(e, _)| e.trim_start_matches('.').eq_ignore_ascii_case(ext)))
                .map(|ext| (*ext).to_string())
                .collect(),
        };
        Classifier::new(rules, playable).or_raise(|| ErrorKind::Classifier)
    }
}
