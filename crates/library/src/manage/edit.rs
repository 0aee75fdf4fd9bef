use crate::manage::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use romshelf_index::{PlayStatus, Repository, TitleDetails, TitleId, TitleRecord};

/// A partial update. `None` keeps the current value; for the optional text
/// fields an empty string clears them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TitleEdit {
    pub title: Option<String>,
    pub platform: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<u16>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub play_status: Option<PlayStatus>,
}

fn merge_text(current: Option<String>, edit: Option<&String>) -> Option<String> {
    match edit {
        None => current,
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.trim().to_string()),
    }
}

impl TitleEdit {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn apply(&self, record: TitleRecord) -> Result<(String, String, TitleDetails)> {
        let title = match &self.title {
            Some(title) if title.trim().is_empty() => exn::bail!(ErrorKind::Invalid("title")),
            Some(title) => title.trim().to_string(),
            None => record.title,
        };
        let platform = match &self.platform {
            Some(platform) if platform.trim().is_empty() => exn::bail!(ErrorKind::Invalid("platform")),
            Some(platform) => platform.trim().to_string(),
            None => record.platform,
        };
        let current = record.details;
        let details = TitleDetails {
            genre: merge_text(current.genre, self.genre.as_ref()),
            release_year: self.release_year.or(current.release_year),
            developer: merge_text(current.developer, self.developer.as_ref()),
            publisher: merge_text(current.publisher, self.publisher.as_ref()),
            description: merge_text(current.description, self.description.as_ref()),
            play_status: self.play_status.unwrap_or(current.play_status),
        };
        Ok((title, platform, details))
    }
}

/// Update a title's display metadata. Storage is never touched, so changing
/// the platform does not move files.
pub async fn edit_title(index: &Repository, id: TitleId, edit: &TitleEdit) -> Result<TitleRecord> {
    let record = index.get(id).await.or_raise(|| ErrorKind::Index)?.ok_or_raise(|| ErrorKind::NotFound(id))?;
    if edit.is_empty() {
        return Ok(record);
    }
    let (title, platform, details) = edit.apply(record)?;
    if !index.update_details(id, &title, &platform, &details).await.or_raise(|| ErrorKind::Index)? {
        exn::bail!(ErrorKind::NotFound(id));
    }
    tracing::info!(%id, %title, %platform, "Edited title");
    index.get(id).await.or_raise(|| ErrorKind::Index)?.ok_or_raise(|| ErrorKind::NotFound(id))
}
