//! Filesystem access for romshelf.
//!
//! - [`walk`] streams every regular file below a directory (used by the scanner
//!   on arbitrary source trees and by the resolver on title directories).
//! - [`archive`] peeks inside zip archives and extracts single members.
//! - [`ManagedRoot`] owns the managed storage tree: it computes the layout,
//!   performs copy/move/extract placements without ever overwriting, and is
//!   the single place where containment is checked.

pub mod archive;
pub mod error;
mod models;
mod path;
mod root;
mod walk;

pub use crate::models::{ArchiveEntry, FileInfo};
pub use crate::path::{is_within, sanitize_segment, validate as validate_path, validate_filename};
pub use crate::root::{FALLBACK_PLATFORM, FALLBACK_TITLE, ManagedRoot};
pub use crate::walk::{FileInfoStream, list, walk};
