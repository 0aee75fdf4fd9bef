//! Discovery of importable titles.
//!
//! [`scan`] walks a directory tree and streams [`ScanEvent`]s: one per file
//! that is importable on its own, or per zip archive that contains an
//! importable member. Items whose would-be stored path is already in the
//! index are reported as known rather than offered again, so scanning the
//! same tree after an import only yields what is new.
//!
//! Nothing is written to disk or to the index while scanning.

mod candidate;
pub mod error;
mod file;
mod stream;
mod title;

pub use self::candidate::{Candidate, CandidateKind};
pub use self::file::inspect_file;
pub use self::stream::{ScanEvent, ScanSummary, collect_candidates, scan};
pub use self::title::guess_title;
