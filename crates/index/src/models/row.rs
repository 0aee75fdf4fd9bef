use crate::error::{Error, ErrorKind};
use crate::models::{TitleDetails, TitleId, TitleRecord};
use exn::ResultExt;
use std::path::PathBuf;
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct TitleRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) platform: String,
    pub(crate) stored_path: String,
    pub(crate) original_filename: String,
    pub(crate) placement: String,
    pub(crate) genre: Option<String>,
    pub(crate) release_year: Option<i64>,
    pub(crate) developer: Option<String>,
    pub(crate) publisher: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) play_status: String,
    pub(crate) imported_at: i64,
}

impl TryFrom<TitleRow> for TitleRecord {
    type Error = Error;
    fn try_from(row: TitleRow) -> Result<Self, Self::Error> {
        let release_year =
            row.release_year.map(u16::try_from).transpose().or_raise(|| ErrorKind::InvalidData("release year"))?;
        Ok(Self {
            id: TitleId::from(row.id),
            title: row.title,
            platform: row.platform,
            stored_path: PathBuf::from(row.stored_path),
            original_filename: row.original_filename,
            placement: row.placement.parse()?,
            details: TitleDetails {
                genre: row.genre,
                release_year,
                developer: row.developer,
                publisher: row.publisher,
                description: row.description,
                play_status: row.play_status.parse()?,
            },
            imported_at: UtcDateTime::from_unix_timestamp(row.imported_at)
                .or_raise(|| ErrorKind::InvalidData("import date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Placement, PlayStatus};

    fn row() -> TitleRow {
        TitleRow {
            id: 7,
            title: "Super Metroid".to_string(),
            platform: "Super Nintendo".to_string(),
            stored_path: "/srv/roms/Super_Nintendo/Super Metroid (USA).sfc".to_string(),
            original_filename: "Super Metroid (USA).sfc".to_string(),
            placement: "copy".to_string(),
            genre: Some("Action".to_string()),
            release_year: Some(1994),
            developer: None,
            publisher: None,
            description: None,
            play_status: "completed".to_string(),
            imported_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_row_to_model() {
        let model = TitleRecord::try_from(row()).unwrap();
        assert_eq!(model.id.get(), 7);
        assert_eq!(model.placement, Placement::Copy);
        assert_eq!(model.details.release_year, Some(1994));
        assert_eq!(model.details.play_status, PlayStatus::Completed);
        assert_eq!(model.imported_at.unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_row_with_bad_placement() {
        let mut row = row();
        row.placement = "teleport".to_string();
        let err = TitleRecord::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("placement")));
    }

    #[test]
    fn test_row_with_out_of_range_year() {
        let mut row = row();
        row.release_year = Some(-5);
        assert!(TitleRecord::try_from(row).is_err());
    }
}
