use crate::error::{Error, ErrorKind};
use crate::extension_of;
use derive_more::Display;
use std::path::Path;
use std::str::FromStr;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
// Empty archives only contain the end-of-central-directory record.
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

/// A container format the scanner can peek inside without extracting.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    #[display("zip")]
    Zip,
}

impl FromStr for ArchiveFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}

impl ArchiveFormat {
    /// Detect an archive format from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        extension_of(path).and_then(|ext| match ext.as_str() {
            "zip" => Some(ArchiveFormat::Zip),
            _ => None,
        })
    }

    /// Detect an archive format from the first bytes of a file.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) {
            return Some(ArchiveFormat::Zip);
        }
        None
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("zip", ArchiveFormat::Zip)]
    #[case("ZIP", ArchiveFormat::Zip)]
    #[case(".zip", ArchiveFormat::Zip)]
    fn test_from_str(#[case] test: &str, #[case] expected: ArchiveFormat) {
        assert_eq!(test.parse::<ArchiveFormat>().unwrap(), expected);
    }

    #[rstest]
    #[case("7z")]
    #[case("rar")]
    #[case(" ")]
    fn test_from_str_unsupported(#[case] test: &str) {
        assert!(test.parse::<ArchiveFormat>().is_err());
    }

    #[rstest]
    #[case("Sonic (USA).zip", Some(ArchiveFormat::Zip))]
    #[case("/library/Pack.ZIP", Some(ArchiveFormat::Zip))]
    #[case("game.sfc", None)]
    // Dotfile with no extension.
    #[case(".zip", None)]
    fn test_from_path(#[case] test: &str, #[case] expected: Option<ArchiveFormat>) {
        assert_eq!(ArchiveFormat::from_path(test), expected);
    }

    #[rstest]
    #[case(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00], Some(ArchiveFormat::Zip))]
    #[case(&[0x50, 0x4B, 0x05, 0x06], Some(ArchiveFormat::Zip))]
    #[case(b"NES\x1a", None)]
    #[case(&[], None)]
    fn test_from_magic_bytes(#[case] bytes: &[u8], #[case] expected: Option<ArchiveFormat>) {
        assert_eq!(ArchiveFormat::from_magic_bytes(bytes), expected);
    }

    #[test]
    fn test_display_matches_extension() {
        assert_eq!(ArchiveFormat::Zip.to_string(), ArchiveFormat::Zip.extension());
    }
}
