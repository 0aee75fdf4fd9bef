use crate::Context;
use crate::resolve::error::{ErrorKind, Result};
use crate::resolve::plan::{contained, resolve_by_id};
use exn::ResultExt;
use romshelf_index::{Repository, TitleId};
use romshelf_storage::ManagedRoot;
use std::ffi::OsStr;
use std::path::PathBuf;
use tokio::fs::File;

/// An opened, checked file ready to be streamed to a client.
#[derive(Debug)]
pub struct ServeTicket {
    pub path: PathBuf,
    pub file: File,
    pub length: u64,
    pub playable: bool,
    pub download_name: String,
}

/// Everything an HTTP handler must do before streaming bytes, in order:
///
/// 1. resolve the record,
/// 2. check `requested_filename` is the base name of the resolved file,
/// 3. check containment again,
/// 4. open the file.
///
/// `requested_filename` is only ever compared. The bytes served always come
/// from the resolved path, never from a path built out of caller input.
#[tracing::instrument(level = "debug", skip(store, index, ctx))]
pub async fn authorize(
    store: &ManagedRoot,
    index: &Repository,
    ctx: &Context,
    id: TitleId,
    requested_filename: &str,
) -> Result<ServeTicket> {
    let plan = resolve_by_id(store, index, ctx, id).await?;
    let Some(actual_file) = plan.actual_file else {
        exn::bail!(ErrorKind::NotFound);
    };
    if actual_file.file_name() != Some(OsStr::new(requested_filename)) {
        tracing::warn!(%id, requested_filename, "Requested file name does not match the resolved file");
        exn::bail!(ErrorKind::NotFound);
    }
    let path = contained(store, &actual_file, id).await?;
    let file = File::open(&path).await.or_raise(|| ErrorKind::Io)?;
    let length = file.metadata().await.or_raise(|| ErrorKind::Io)?.len();
    tracing::debug!(%id, path = %path.display(), length, "Serving file");
    Ok(ServeTicket {
        path,
        file,
        length,
        playable: plan.playable,
        download_name: plan.download_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use romshelf_index::{Database, NewTitle, Placement, TitleDetails, TitleRecord};
    use std::path::Path;
    use tokio::io::AsyncReadExt;

    async fn setup(stored: impl FnOnce(&Path) -> PathBuf) -> (tempfile::TempDir, ManagedRoot, Database, TitleRecord) {
        let temp = tempfile::tempdir().unwrap();
        let store = ManagedRoot::new(temp.path().join("library")).unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        let stored_path = stored(temp.path());
        let record = Repository::from(&db)
            .insert(&NewTitle {
                title: "Metroid".to_string(),
                platform: "Nintendo Entertainment System".to_string(),
                stored_path,
                original_filename: "Metroid (USA).nes".to_string(),
                placement: Placement::Copy,
                details: TitleDetails::default(),
            })
            .await
            .unwrap();
        (temp, store, db, record)
    }

    fn in_library(temp: &Path) -> PathBuf {
        let dir = temp.canonicalize().unwrap().join("library/NES");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Metroid (USA).nes"), b"NES\x1a").unwrap();
        dir.join("Metroid (USA).nes")
    }

    #[tokio::test]
    async fn test_authorize_opens_resolved_file() {
        let (_temp, store, db, record) = setup(in_library).await;
        let index = Repository::from(&db);
        let mut ticket = authorize(&store, &index, &Context::default(), record.id, "Metroid (USA).nes").await.unwrap();
        assert_eq!(ticket.length, 4);
        assert!(ticket.playable);
        assert_eq!(ticket.download_name, "Metroid (USA).nes");
        let mut bytes = Vec::new();
        ticket.file.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, b"NES\x1a");
    }

    #[tokio::test]
    async fn test_authorize_rejects_other_file_names() {
        let (_temp, store, db, record) = setup(in_library).await;
        let index = Repository::from(&db);
        for requested in ["other.nes", "../Metroid (USA).nes", "", "NES/Metroid (USA).nes"] {
            let err = authorize(&store, &index, &Context::default(), record.id, requested).await.unwrap_err();
            assert_eq!(*err, ErrorKind::NotFound, "{requested}");
        }
    }

    #[tokio::test]
    async fn test_authorize_outside_root() {
        let (_temp, store, db, record) = setup(|temp| {
            let path = temp.canonicalize().unwrap().join("Metroid (USA).nes");
            std::fs::write(&path, b"NES").unwrap();
            path
        })
        .await;
        let index = Repository::from(&db);
        let err = authorize(&store, &index, &Context::default(), record.id, "Metroid (USA).nes").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Forbidden);
    }
}
