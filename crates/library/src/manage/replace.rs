use crate::Context;
use crate::manage::error::{Error, ErrorKind, Result};
use crate::manage::owns_storage;
use exn::{OptionExt, ResultExt};
use romshelf_index::error::ErrorKind as IndexErrorKind;
use romshelf_index::{Placement, Repository, TitleId, TitleRecord};
use romshelf_storage::ManagedRoot;
use romshelf_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};
use std::path::Path;

fn storage_failure(err: StorageError) -> Error {
    let kind = match &*err {
        StorageErrorKind::AlreadyExists(path) => ErrorKind::AlreadyExists(path.clone()),
        StorageErrorKind::InvalidPath(_) => ErrorKind::Invalid("file name"),
        _ => ErrorKind::Io,
    };
    err.raise(kind)
}

/// Copy `new_source` next to `dest` and rename it over the old file, once
/// the index has accepted the change. Until the rename, the old file is
/// untouched; any failure removes the staged copy.
async fn replace_in_place(
    store: &ManagedRoot,
    index: &Repository,
    id: TitleId,
    new_source: &Path,
    dest: &Path,
    filename: &str,
) -> Result<()> {
    let staged = dest.with_file_name(format!(".{filename}.replacing"));
    store.copy_into(new_source, &staged).await.map_err(storage_failure)?;
    let swapped = match index.update_location(id, dest, filename, Placement::Copy).await {
        Ok(true) => store.swap_in(&staged, dest).await.map_err(storage_failure),
        Ok(false) => Err(Error::from(ErrorKind::NotFound(id))),
        Err(e) => Err(e.raise(ErrorKind::Index)),
    };
    if let Err(err) = swapped {
        if let Err(e) = store.remove_file(&staged).await {
            tracing::error!(path = %staged.display(), error = %&*e, "Could not remove staged replacement");
        }
        return Err(err);
    }
    Ok(())
}

/// Swap the payload of a title for `new_source`.
///
/// The new file is copied to `<root>/<platform>/<file name>`, the record is
/// pointed at it with placement `Copy`, and only then is the old storage
/// removed, if the record owned it. When the index update fails the new copy
/// is removed again and the record is unchanged.
///
/// A new file with the same name as the owned file it replaces is swapped in
/// over it. Any other existing file at the destination is never overwritten.
#[tracing::instrument(level = "debug", skip(store, index, ctx, new_source), fields(source = %new_source.as_ref().display()))]
pub async fn replace_file(
    store: &ManagedRoot,
    index: &Repository,
    ctx: &Context,
    id: TitleId,
    new_source: impl AsRef<Path>,
) -> Result<TitleRecord> {
    let new_source = new_source.as_ref();
    let record = index.get(id).await.or_raise(|| ErrorKind::Index)?.ok_or_raise(|| ErrorKind::NotFound(id))?;
    if !ctx.classifier.classify_path(new_source).is_known() {
        exn::bail!(ErrorKind::Invalid("file type"));
    }
    let filename = new_source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_raise(|| ErrorKind::Invalid("file name"))?
        .to_string();

    let dest = store.file_destination(&record.platform, &filename).map_err(storage_failure)?;
    let same_file = dest == record.stored_path
        && owns_storage(store, &record).await
        && tokio::fs::metadata(&dest).await.is_ok_and(|metadata| metadata.is_file());
    if same_file {
        replace_in_place(store, index, id, new_source, &dest, &filename).await?;
    } else {
        replace_elsewhere(store, index, &record, new_source, &dest, &filename).await?;
    }
    tracing::info!(%id, path = %dest.display(), "Replaced title file");
    index.get(id).await.or_raise(|| ErrorKind::Index)?.ok_or_raise(|| ErrorKind::NotFound(id))
}

async fn replace_elsewhere(
    store: &ManagedRoot,
    index: &Repository,
    record: &TitleRecord,
    new_source: &Path,
    dest: &Path,
    filename: &str,
) -> Result<()> {
    let id = record.id;
    store.copy_into(new_source, dest).await.map_err(storage_failure)?;

    let updated = index.update_location(id, dest, filename, Placement::Copy).await;
    let failure = match updated {
        Ok(true) => None,
        Ok(false) => Some(Error::from(ErrorKind::NotFound(id))),
        Err(e) => {
            let kind = match &*e {
                IndexErrorKind::AlreadyExists(path) => ErrorKind::AlreadyExists(path.clone()),
                _ => ErrorKind::Index,
            };
            Some(e.raise(kind))
        },
    };
    if let Some(err) = failure {
        if let Err(e) = store.remove_file(dest).await {
            tracing::error!(path = %dest.display(), error = %&*e, "Could not remove replacement after a failed update");
        }
        return Err(err);
    }

    if owns_storage(store, record).await {
        match store.remove(&record.stored_path).await {
            Ok(()) => {
                if let Some(parent) = record.stored_path.parent() {
                    _ = store.prune_empty_dirs(parent, store.path()).await;
                }
            },
            Err(e) => {
                tracing::warn!(path = %record.stored_path.display(), error = %&*e, "Could not remove replaced storage");
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use romshelf_index::{Database, NewTitle, TitleDetails};
    use std::path::PathBuf;

    struct Fixture {
        temp: tempfile::TempDir,
        store: ManagedRoot,
        db: Database,
    }

    async fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let store = ManagedRoot::new(temp.path().join("library")).unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        Fixture { temp, store, db }
    }

    async fn insert(f: &Fixture, stored_path: PathBuf, placement: Placement) -> TitleRecord {
        Repository::from(&f.db)
            .insert(&NewTitle {
                title: "Tetris".to_string(),
                platform: "Game Boy".to_string(),
                original_filename: stored_path.file_name().unwrap().to_string_lossy().into_owned(),
                stored_path,
                placement,
                details: TitleDetails::default(),
            })
            .await
            .unwrap()
    }

    fn write(path: &Path, data: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    #[tokio::test]
    async fn test_replace_owned_copy() {
        let f = fixture().await;
        let old = f.store.path().join("Game_Boy/tetris.gb");
        write(&old, b"v1");
        let record = insert(&f, old.clone(), Placement::Copy).await;
        let source = f.temp.path().join("tetris (rev 1).gb");
        write(&source, b"v2");

        let index = Repository::from(&f.db);
        let updated = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap();
        assert_eq!(updated.stored_path, f.store.path().join("Game_Boy/tetris (rev 1).gb"));
        assert_eq!(updated.original_filename, "tetris (rev 1).gb");
        assert_eq!(updated.placement, Placement::Copy);
        assert_eq!(std::fs::read(&updated.stored_path).unwrap(), b"v2");
        assert!(!old.exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_replace_with_same_file_name() {
        let f = fixture().await;
        let old = f.store.path().join("Game_Boy/tetris.gb");
        write(&old, b"v1");
        let record = insert(&f, old.clone(), Placement::Move).await;
        let source = f.temp.path().join("fixed/tetris.gb");
        write(&source, b"v2");

        let index = Repository::from(&f.db);
        let updated = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap();
        assert_eq!(updated.stored_path, old);
        assert_eq!(updated.placement, Placement::Copy);
        assert_eq!(std::fs::read(&old).unwrap(), b"v2");
        assert!(source.exists());
        // Only the replaced file remains; the staged copy is gone.
        let names: Vec<_> = std::fs::read_dir(old.parent().unwrap()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("tetris.gb")]);
    }

    #[tokio::test]
    async fn test_replace_same_name_never_overwrites_referenced_file() {
        let f = fixture().await;
        let referenced = f.store.path().join("Game_Boy/tetris.gb");
        write(&referenced, b"v1");
        let record = insert(&f, referenced.clone(), Placement::Reference).await;
        let source = f.temp.path().join("fixed/tetris.gb");
        write(&source, b"v2");

        let index = Repository::from(&f.db);
        let err = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(std::fs::read(&referenced).unwrap(), b"v1");
    }

    #[tokio::test]
    async fn test_replace_reference_keeps_original() {
        let f = fixture().await;
        let referenced = f.temp.path().join("roms/tetris.gb");
        write(&referenced, b"v1");
        let record = insert(&f, referenced.clone(), Placement::Reference).await;
        let source = f.temp.path().join("tetris-dx.gb");
        write(&source, b"v2");

        let index = Repository::from(&f.db);
        let updated = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap();
        assert!(updated.stored_path.starts_with(f.store.path()));
        assert!(referenced.exists());
    }

    #[tokio::test]
    async fn test_replace_never_overwrites() {
        let f = fixture().await;
        let old = f.store.path().join("Game_Boy/tetris.gb");
        write(&old, b"v1");
        let record = insert(&f, old.clone(), Placement::Copy).await;
        let taken = f.store.path().join("Game_Boy/other.gb");
        write(&taken, b"someone else");
        let source = f.temp.path().join("other.gb");
        write(&source, b"v2");

        let index = Repository::from(&f.db);
        let err = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(std::fs::read(&taken).unwrap(), b"someone else");
        assert_eq!(std::fs::read(&old).unwrap(), b"v1");
        assert_eq!(index.get(record.id).await.unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn test_replace_rolls_back_on_index_conflict() {
        let f = fixture().await;
        let old = f.store.path().join("Game_Boy/tetris.gb");
        write(&old, b"v1");
        let record = insert(&f, old.clone(), Placement::Copy).await;
        // Another record already claims the destination, although nothing is on disk there.
        let claimed = f.store.path().join("Game_Boy/tetris-dx.gb");
        insert(&f, claimed.clone(), Placement::Copy).await;
        let source = f.temp.path().join("tetris-dx.gb");
        write(&source, b"v2");

        let index = Repository::from(&f.db);
        let err = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert!(!claimed.exists());
        assert!(old.exists());
    }

    #[tokio::test]
    async fn test_replace_rejects_unknown_file_type() {
        let f = fixture().await;
        let old = f.store.path().join("Game_Boy/tetris.gb");
        write(&old, b"v1");
        let record = insert(&f, old, Placement::Copy).await;
        let source = f.temp.path().join("notes.txt");
        write(&source, b"hello");

        let index = Repository::from(&f.db);
        let err = replace_file(&f.store, &index, &Context::default(), record.id, &source).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid("file type")));
    }
}
