use crate::Context;
use crate::scan::error::{ErrorKind, Result};
use crate::scan::{Candidate, guess_title};
use exn::ResultExt;
use romshelf_classify::{Platform, extension_of};
use romshelf_storage::FileInfo;
use romshelf_storage::archive::list_entries;
use romshelf_storage::error::ErrorKind as StorageErrorKind;
use std::ops::Deref;

/// Decide whether a single file is an import candidate.
///
/// - Zip archives are opened (never extracted) and their best-ranked
///   importable member is chosen; archives with no such member yield `None`.
/// - Other files are candidates when their extension is importable.
///
/// # Errors
/// [`ErrorKind::BadArchive`] when a zip cannot be read. The scan stream turns
/// this into a skipped item rather than stopping.
#[tracing::instrument(level = "debug", skip_all, fields(path = %file.path.display()))]
pub async fn inspect_file(ctx: &Context, file: &FileInfo) -> Result<Option<Candidate>> {
    let classifier = &ctx.classifier;
    if file.archive.is_some() {
        let entries = match list_entries(&file.path).await {
            Ok(entries) => entries,
            Err(e) if matches!(e.deref(), StorageErrorKind::BadArchive(_)) => {
                return Err(e).or_raise(|| ErrorKind::BadArchive(file.path.clone()));
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
        };
        let names = entries.iter().filter(|entry| !entry.is_dir).map(|entry| entry.name.as_str());
        let Some(entry) = classifier.pick_primary(names) else {
            tracing::debug!(members = entries.len(), "Archive has no importable member");
            return Ok(None);
        };
        let platform = extension_of(entry).map(|ext| classifier.platform_for(&ext)).unwrap_or_else(Platform::other);
        tracing::trace!(entry, %platform, "Picked archive member");
        return Ok(Some(Candidate::archive(&file.path, entry, guess_title(entry), platform, file.size)));
    }

    let Some(extension) = extension_of(&file.path) else {
        return Ok(None);
    };
    if !classifier.is_importable(&extension) {
        return Ok(None);
    }
    let name = file.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let platform = classifier.platform_for(&extension);
    Ok(Some(Candidate::file(&file.path, guess_title(&name), platform, file.size)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use time::OffsetDateTime;

    fn info(path: &Path) -> FileInfo {
        let size = std::fs::metadata(path).unwrap().len();
        FileInfo::new(path, size, OffsetDateTime::UNIX_EPOCH)
    }

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in members {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn test_loose_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Mega_Man_2 (USA).nes");
        std::fs::write(&path, b"NES\x1a").unwrap();
        let candidate = inspect_file(&Context::default(), &info(&path)).await.unwrap().unwrap();
        assert_eq!(candidate.title, "Mega Man 2");
        assert_eq!(candidate.platform, Platform::from("Nintendo Entertainment System"));
        assert_eq!(candidate.size, 4);
        assert!(!candidate.is_archive());
    }

    #[tokio::test]
    async fn test_unimportable_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(inspect_file(&Context::default(), &info(&path)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_archive_picks_primary_member() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Chrono Trigger.zip");
        write_zip(&path, &[("manual.txt", b"read me"), ("save.bin", b"\0\0"), ("Chrono Trigger (USA).sfc", b"SNES")]);
        let candidate = inspect_file(&Context::default(), &info(&path)).await.unwrap().unwrap();
        assert_eq!(candidate.archive_entry(), Some("Chrono Trigger (USA).sfc"));
        assert_eq!(candidate.title, "Chrono Trigger");
        assert_eq!(candidate.platform, Platform::from("Super Nintendo"));
    }

    #[tokio::test]
    async fn test_archive_without_payload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("docs.zip");
        write_zip(&path, &[("readme.txt", b"hi")]);
        assert!(inspect_file(&Context::default(), &info(&path)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.zip");
        std::fs::write(&path, b"garbage").unwrap();
        let err = inspect_file(&Context::default(), &info(&path)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BadArchive(p) if p == &path));
    }
}
