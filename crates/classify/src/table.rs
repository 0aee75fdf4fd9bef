use crate::error::{ErrorKind, Result};
use crate::{Classification, Platform, extension_of, normalize_extension};
use exn::OptionExt;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Built-in extension table, in preference order.
///
/// Platform-specific cartridge formats come first, disc images after them,
/// and the generic binary catch-alls (`bin`, `iso`, `exe`, `rom`) last.
pub const BUILTIN_TABLE: &[(&str, &str)] = &[
    ("sfc", "Super Nintendo"),
    ("smc", "Super Nintendo"),
    ("nes", "Nintendo Entertainment System"),
    ("gb", "Game Boy"),
    ("gbc", "Game Boy Color"),
    ("gba", "Game Boy Advance"),
    ("gen", "Sega Genesis"),
    ("md", "Sega Genesis"),
    ("smd", "Sega Genesis"),
    ("sms", "Sega Master System"),
    ("gg", "Game Gear"),
    ("n64", "Nintendo 64"),
    ("z64", "Nintendo 64"),
    ("v64", "Nintendo 64"),
    ("nds", "Nintendo DS"),
    ("3ds", "Nintendo 3DS"),
    ("cia", "Nintendo 3DS"),
    ("nsp", "Nintendo Switch"),
    ("xci", "Nintendo Switch"),
    ("rpx", "Nintendo Wii U"),
    ("wud", "Nintendo Wii U"),
    ("wii", "Nintendo Wii"),
    ("gc", "Nintendo GameCube"),
    ("cxb", "Xbox"),
    ("ps1", "PlayStation 1"),
    ("chd", "PlayStation 1"),
    ("cue", "PlayStation 1"),
    ("iso", "PlayStation 1"),
    ("bin", "PlayStation 1"),
    ("exe", "PC"),
    ("rom", "Other"),
];

/// Extensions that can be handed to an in-browser emulator core.
pub const BUILTIN_PLAYABLE: &[&str] = &["sfc", "smc", "nes", "gb", "gbc", "gba", "gen", "md", "smd"];

/// One row of the classifier table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionRule {
    /// Normalised extension (lowercase, no dot).
    pub extension: String,
    pub platform: Platform,
}

/// Data-driven extension to platform mapping.
///
/// Holds the importable table (whose order is the preference order) and the
/// playable allow-list, which must be a subset of the table.
#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Vec<ExtensionRule>,
    ranks: HashMap<String, usize>,
    playable: HashSet<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        let rules = BUILTIN_TABLE
            .iter()
            .map(|(extension, platform)| ExtensionRule {
                extension: (*extension).to_string(),
                platform: Platform::from(*platform),
            })
            .collect();
        let playable = BUILTIN_PLAYABLE.iter().map(|ext| (*ext).to_string()).collect();
        Self::assemble(rules, playable)
    }
}

impl Classifier {
    /// Build a classifier from an ordered `(extension, platform)` table and a
    /// playable allow-list.
    ///
    /// # Errors
    /// - [`ErrorKind::InvalidExtension`] for blank extensions.
    /// - [`ErrorKind::DuplicateExtension`] if the table lists an extension twice.
    /// - [`ErrorKind::NotImportable`] if a playable extension is not in the table.
    pub fn new<R, E, P, S>(rules: R, playable: impl IntoIterator<Item = S>) -> Result<Self>
    where
        R: IntoIterator<Item = (E, P)>,
        E: AsRef<str>,
        P: Into<Platform>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut table = Vec::new();
        for (extension, platform) in rules {
            let raw = extension.as_ref();
            let extension = normalize_extension(raw).ok_or_raise(|| ErrorKind::InvalidExtension(raw.to_string()))?;
            if !seen.insert(extension.clone()) {
                exn::bail!(ErrorKind::DuplicateExtension(extension));
            }
            table.push(ExtensionRule { extension, platform: platform.into() });
        }
        let mut allowed = HashSet::new();
        for extension in playable {
            let raw = extension.as_ref();
            let extension = normalize_extension(raw).ok_or_raise(|| ErrorKind::InvalidExtension(raw.to_string()))?;
            if !seen.contains(&extension) {
                exn::bail!(ErrorKind::NotImportable(extension));
            }
            allowed.insert(extension);
        }
        tracing::debug!(importable = table.len(), playable = allowed.len(), "Built classifier table");
        Ok(Self::assemble(table, allowed))
    }

    fn assemble(rules: Vec<ExtensionRule>, playable: HashSet<String>) -> Self {
        let ranks = rules.iter().enumerate().map(|(rank, rule)| (rule.extension.clone(), rank)).collect();
        Self { rules, ranks, playable }
    }

    /// The table rows, in preference order.
    pub fn rules(&self) -> &[ExtensionRule] {
        &self.rules
    }

    /// Look up an extension (case-insensitive, leading dot optional).
    pub fn classify(&self, extension: &str) -> Classification {
        match self.rank(extension) {
            Some(rank) => Classification::Known(self.rules[rank].platform.clone()),
            None => Classification::Unknown,
        }
    }

    /// Like [`classify`](Self::classify), but unrecognised extensions map to
    /// [`Platform::other`].
    pub fn platform_for(&self, extension: &str) -> Platform {
        self.classify(extension).into_platform()
    }

    /// Classify by the extension of a path or archive member name.
    pub fn classify_path(&self, path: impl AsRef<Path>) -> Classification {
        match extension_of(path) {
            Some(extension) => self.classify(&extension),
            None => Classification::Unknown,
        }
    }

    pub fn is_importable(&self, extension: &str) -> bool {
        self.rank(extension).is_some()
    }

    pub fn is_playable(&self, extension: &str) -> bool {
        normalize_extension(extension).is_some_and(|ext| self.playable.contains(&ext))
    }

    pub fn is_playable_path(&self, path: impl AsRef<Path>) -> bool {
        extension_of(path).is_some_and(|ext| self.playable.contains(&ext))
    }

    /// Preference rank of an extension; lower is better.
    pub fn rank(&self, extension: &str) -> Option<usize> {
        normalize_extension(extension).and_then(|ext| self.ranks.get(&ext).copied())
    }

    /// Preference rank of a path, if its extension is playable.
    pub fn playable_rank(&self, path: impl AsRef<Path>) -> Option<usize> {
        extension_of(path).filter(|ext| self.playable.contains(ext)).and_then(|ext| self.ranks.get(&ext).copied())
    }

    /// Choose the primary payload among archive member names.
    ///
    /// Directory entries (trailing `/`) and names without an importable
    /// extension are ignored. The best-ranked extension wins; ties go to the
    /// member listed first.
    pub fn pick_primary<'a, I>(&self, names: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| !name.ends_with('/'))
            .filter_map(|name| extension_of(name).and_then(|ext| self.ranks.get(&ext).copied()).map(|rank| (rank, name)))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_builtin_table_is_valid() {
        assert!(Classifier::new(BUILTIN_TABLE.iter().copied(), BUILTIN_PLAYABLE.iter().copied()).is_ok());
        assert_eq!(Classifier::default().rules().len(), BUILTIN_TABLE.len());
    }

    #[rstest]
    #[case("sfc", "Super Nintendo")]
    #[case(".SMC", "Super Nintendo")]
    #[case("nes", "Nintendo Entertainment System")]
    #[case("GBA", "Game Boy Advance")]
    #[case("md", "Sega Genesis")]
    #[case("z64", "Nintendo 64")]
    #[case("iso", "PlayStation 1")]
    #[case("exe", "PC")]
    fn test_classify_known(#[case] extension: &str, #[case] platform: &str) {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(extension), Classification::Known(Platform::from(platform)));
    }

    #[rstest]
    #[case("txt")]
    #[case("zip")]
    #[case("srm")]
    #[case("")]
    fn test_classify_unknown(#[case] extension: &str) {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(extension), Classification::Unknown);
        assert_eq!(classifier.platform_for(extension), Platform::other());
        assert!(!classifier.is_importable(extension));
    }

    #[rstest]
    #[case("nes", true)]
    #[case("sfc", true)]
    #[case(".GB", true)]
    #[case("iso", false)]
    #[case("bin", false)]
    #[case("n64", false)]
    #[case("zip", false)]
    fn test_playable_is_narrower_than_importable(#[case] extension: &str, #[case] playable: bool) {
        let classifier = Classifier::default();
        assert_eq!(classifier.is_playable(extension), playable);
        if playable {
            assert!(classifier.is_importable(extension));
        }
    }

    #[test]
    fn test_playable_rank() {
        let classifier = Classifier::default();
        assert_eq!(classifier.playable_rank("a/b/game.SFC"), Some(0));
        assert!(classifier.playable_rank("disc.iso").is_none());
        assert!(classifier.playable_rank("notes").is_none());
    }

    #[rstest]
    #[case(&["manual.txt", "game.sfc"], Some("game.sfc"))]
    #[case(&["game.sfc", "manual.txt"], Some("game.sfc"))]
    #[case(&["track01.bin", "game.cue"], Some("game.cue"))]
    #[case(&["setup.exe", "data.rom", "disc.iso"], Some("disc.iso"))]
    #[case(&["first.nes", "second.nes"], Some("first.nes"))]
    #[case(&["roms/", "roms/game.gba"], Some("roms/game.gba"))]
    #[case(&["readme.md.txt", "save.srm"], None)]
    #[case(&[], None)]
    fn test_pick_primary(#[case] names: &[&str], #[case] expected: Option<&str>) {
        let classifier = Classifier::default();
        assert_eq!(classifier.pick_primary(names.iter().copied()), expected);
    }

    #[test]
    fn test_custom_table() {
        let classifier = Classifier::new([("nes", "Famicom"), (".FDS", "Famicom Disk System")], ["nes"]).unwrap();
        assert_eq!(classifier.platform_for("fds"), Platform::from("Famicom Disk System"));
        assert_eq!(classifier.platform_for("sfc"), Platform::other());
        assert!(classifier.is_playable("nes"));
        assert!(!classifier.is_playable("fds"));
    }

    #[test]
    fn test_rejects_duplicate_extension() {
        let err = Classifier::new([("nes", "A"), ("NES", "B")], Vec::<&str>::new()).unwrap_err();
        assert_eq!(*err, ErrorKind::DuplicateExtension("nes".to_string()));
    }

    #[test]
    fn test_rejects_playable_outside_table() {
        let err = Classifier::new([("nes", "NES")], ["sfc"]).unwrap_err();
        assert_eq!(*err, ErrorKind::NotImportable("sfc".to_string()));
    }

    #[test]
    fn test_rejects_blank_extension() {
        let err = Classifier::new([(".", "Nothing")], Vec::<&str>::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidExtension(_)));
    }
}
