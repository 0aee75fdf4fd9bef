//! Pure path checks: nothing here touches the filesystem.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Lexically normalise a path that is meant to be relative to the managed
/// root, rejecting anything that climbs above it.
///
/// Leading `/` and `.` components are dropped and `..` is applied as it
/// goes. Null bytes, Windows prefixes, empty results and `..` past the start
/// are [`ErrorKind::InvalidPath`]. Symlinks are not considered; see
/// [`ManagedRoot::contains`](crate::ManagedRoot::contains) for that.
///
/// ```
/// use std::path::Path;
/// use romshelf_storage::validate_path;
/// assert_eq!(validate_path("SNES/./game.sfc/").unwrap(), Path::new("SNES/game.sfc"));
/// assert_eq!(validate_path("tmp/../game.sfc").unwrap(), Path::new("game.sfc"));
/// assert!(validate_path("SNES/../../secret").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validates that `name` is a single, plain filename (no directories).
pub fn validate_filename(name: impl AsRef<Path>) -> Result<PathBuf> {
    let name = name.as_ref();
    let validated = validate(name)?;
    if validated.components().count() != 1 || validated != name {
        exn::bail!(ErrorKind::InvalidPath(name.to_path_buf()));
    }
    Ok(validated)
}

/// Reduce a display label to a safe, single directory segment.
///
/// Keeps alphanumerics, spaces and underscores, trims the result and turns
/// spaces into underscores. Falls back to `fallback` when nothing survives.
///
/// ```
/// use romshelf_storage::sanitize_segment;
/// assert_eq!(sanitize_segment("Super Nintendo", "Other"), "Super_Nintendo");
/// assert_eq!(sanitize_segment("../../etc", "Other"), "etc");
/// assert_eq!(sanitize_segment("???", "Other"), "Other");
/// ```
pub fn sanitize_segment(label: &str, fallback: &str) -> String {
    let kept: String = label.chars().filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_').collect();
    let trimmed = kept.trim();
    match trimmed.is_empty() {
        true => fallback.to_string(),
        false => trimmed.replace(' ', "_"),
    }
}

/// Component-wise containment: `path` equals `root` or descends from it.
///
/// Both paths must already be canonical; `/srv/roms2` is **not** inside
/// `/srv/roms` because [`Path::starts_with`] compares whole components.
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SNES/game.sfc", "SNES/game.sfc")]
    #[case("simple.gb", "simple.gb")]
    #[case("/Game_Boy/tetris.gb", "Game_Boy/tetris.gb")]
    #[case("NES//./Zelda/", "NES/Zelda")]
    #[case("NES/Zelda/..", "NES")]
    fn test_validate_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("//")]
    #[case("..")]
    #[case("../roms/game.nes")]
    #[case("NES/../../game.nes")]
    #[case("NES/ga\0me.nes")]
    fn test_validate_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    #[case("game.sfc", true)]
    #[case("Legend of Zelda, The (USA).nes", true)]
    #[case("dir/game.sfc", false)]
    #[case("../game.sfc", false)]
    #[case("/game.sfc", false)]
    #[case("./game.sfc", false)]
    #[case("", false)]
    fn test_validate_filename(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_filename(name).is_ok(), valid);
    }

    #[rstest]
    #[case("Super Nintendo", "Super_Nintendo")]
    #[case("  Game Boy Color  ", "Game_Boy_Color")]
    #[case("Sonic & Knuckles", "Sonic__Knuckles")]
    #[case("PlayStation 1", "PlayStation_1")]
    #[case("../../etc/passwd", "etcpasswd")]
    #[case("Pokémon_Red", "Pokémon_Red")]
    #[case("", "Other")]
    #[case("!!!", "Other")]
    #[case("   ", "Other")]
    fn test_sanitize_segment(#[case] label: &str, #[case] expected: &str) {
        assert_eq!(sanitize_segment(label, "Other"), expected);
    }

    #[rstest]
    #[case("/srv/roms", "/srv/roms", true)]
    #[case("/srv/roms", "/srv/roms/SNES/game.sfc", true)]
    #[case("/srv/roms", "/srv/roms2/game.sfc", false)]
    #[case("/srv/roms", "/srv", false)]
    #[case("/srv/roms", "/etc/passwd", false)]
    fn test_is_within(#[case] root: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_within(Path::new(root), Path::new(path)), expected);
    }
}
