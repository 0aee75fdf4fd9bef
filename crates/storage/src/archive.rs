//! Zip archive access.
//!
//! Archives are only ever *peeked* ([`list_entries`]) or have a *single*
//! member extracted ([`extract_entry`]); unrelated archive contents never land
//! on disk. The `zip` crate is synchronous, so all work happens on Tokio's
//! blocking pool.

use crate::error::{ErrorKind, Result, map_io_error};
use crate::models::ArchiveEntry;
use crate::path::validate as validate_path;
use exn::{OptionExt, ResultExt};
use romshelf_classify::ArchiveFormat;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

fn open(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let mut file = File::open(path).map_err(|e| map_io_error(e, path))?;
    let mut head = Vec::with_capacity(4);
    (&mut file).take(4).read_to_end(&mut head).map_err(|e| map_io_error(e, path))?;
    if ArchiveFormat::from_magic_bytes(&head) != Some(ArchiveFormat::Zip) {
        exn::bail!(ErrorKind::BadArchive(path.to_path_buf()));
    }
    file.seek(SeekFrom::Start(0)).map_err(|e| map_io_error(e, path))?;
    ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::BadArchive(path.to_path_buf()))
}

fn list_entries_blocking(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open(path)?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index).or_raise(|| ErrorKind::BadArchive(path.to_path_buf()))?;
        entries.push(ArchiveEntry {
            name: entry.name().to_string(),
            size: entry.size(),
            is_dir: entry.is_dir(),
        });
    }
    Ok(entries)
}

fn extract_entry_blocking(path: &Path, name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let mut archive = open(path)?;
    let mut member = match archive.by_name(name) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => exn::bail!(ErrorKind::EntryNotFound(name.to_string())),
        Err(e) => return Err(e).or_raise(|| ErrorKind::BadArchive(path.to_path_buf())),
    };
    if member.is_dir() {
        exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name)));
    }
    // `enclosed_name` rejects absolute names and `..` escapes (zip-slip).
    let relative = member.enclosed_name().ok_or_raise(|| ErrorKind::InvalidPath(PathBuf::from(name)))?;
    let target = dest_dir.join(validate_path(relative)?);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| map_io_error(e, parent))?;
    }
    let mut out = OpenOptions::new().write(true).create_new(true).open(&target).map_err(|e| map_io_error(e, &target))?;
    if let Err(e) = std::io::copy(&mut member, &mut out) {
        drop(out);
        _ = std::fs::remove_file(&target);
        return match e.kind() {
            // Decompression and checksum failures surface as InvalidData.
            std::io::ErrorKind::InvalidData => Err(e).or_raise(|| ErrorKind::BadArchive(path.to_path_buf())),
            _ => Err(map_io_error(e, &target).into()),
        };
    }
    Ok(target)
}

/// List every member of a zip archive without extracting anything.
///
/// # Errors
/// [`ErrorKind::BadArchive`] if the file is not a readable zip archive.
pub async fn list_entries(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || list_entries_blocking(&path)).await.or_raise(|| ErrorKind::Task)?
}

/// Extract the single member `name` of the archive at `path` into `dest_dir`,
/// keeping the member's relative path. Returns the path of the written file.
///
/// Never overwrites: an existing file at the destination fails with
/// [`ErrorKind::AlreadyExists`]. A partially written file is removed.
pub async fn extract_entry(path: &Path, name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let path = path.to_path_buf();
    let name = name.to_string();
    let dest_dir = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || extract_entry_blocking(&path, &name, &dest_dir))
        .await
        .or_raise(|| ErrorKind::Task)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in members {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn test_list_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("pack.zip");
        write_zip(&archive, &[("manual.txt", b"read me"), ("roms/", b""), ("roms/game.sfc", b"SNES")]);
        let entries = list_entries(&archive).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["manual.txt", "roms/", "roms/game.sfc"]);
        assert!(entries[1].is_dir);
        assert_eq!(entries[2].size, 4);
    }

    #[tokio::test]
    async fn test_list_entries_rejects_garbage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip file").unwrap();
        let err = list_entries(&archive).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BadArchive(_)));
    }

    #[tokio::test]
    async fn test_list_entries_rejects_truncated_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("truncated.zip");
        write_zip(&archive, &[("game.nes", b"NES\x1a")]);
        let bytes = std::fs::read(&archive).unwrap();
        std::fs::write(&archive, &bytes[..bytes.len() / 2]).unwrap();
        let err = list_entries(&archive).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BadArchive(_)));
    }

    #[tokio::test]
    async fn test_extract_single_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("pack.zip");
        write_zip(&archive, &[("manual.txt", b"read me"), ("roms/game.sfc", b"SNES")]);
        let dest = temp_dir.path().join("out");
        let written = extract_entry(&archive, "roms/game.sfc", &dest).await.unwrap();
        assert_eq!(written, dest.join("roms/game.sfc"));
        assert_eq!(std::fs::read(&written).unwrap(), b"SNES");
        assert!(!dest.join("manual.txt").exists());
    }

    #[tokio::test]
    async fn test_extract_never_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("pack.zip");
        write_zip(&archive, &[("game.nes", b"new")]);
        let dest = temp_dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("game.nes"), b"old").unwrap();
        let err = extract_entry(&archive, "game.nes", &dest).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(std::fs::read(dest.join("game.nes")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_extract_missing_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("pack.zip");
        write_zip(&archive, &[("game.nes", b"NES")]);
        let err = extract_entry(&archive, "other.nes", temp_dir.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::EntryNotFound(_)));
    }

    #[tokio::test]
    async fn test_extract_rejects_zip_slip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("evil.zip");
        write_zip(&archive, &[("../../escape.nes", b"NES")]);
        let dest = temp_dir.path().join("a/b");
        let err = extract_entry(&archive, "../../escape.nes", &dest).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert!(!temp_dir.path().join("escape.nes").exists());
    }
}
