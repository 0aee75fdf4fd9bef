mod row;
mod title;

pub(crate) use self::row::TitleRow;
pub use self::title::{NewTitle, Placement, PlayStatus, TitleDetails, TitleId, TitleRecord};
