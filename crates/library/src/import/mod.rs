//! Committing candidates into the managed store.
//!
//! [`import`] processes candidates one at a time, in order, under a single
//! [`PlacementPolicy`](crate::PlacementPolicy):
//!
//! | Candidate   | Copy / Move                          | ReferenceInPlace        |
//! |-------------|--------------------------------------|-------------------------|
//! | single file | `<root>/<platform>/<file name>`      | source path, untouched  |
//! | archive     | `<root>/<platform>/<archive stem>/`, chosen member only    ||
//!
//! Each candidate yields its own [`ImportOutcome`]; a batch is never
//! all-or-nothing.

pub mod error;
mod file;
mod outcome;
mod stream;

pub use self::file::import_candidate;
pub use self::outcome::{FailureKind, ImportOutcome, ImportStatus, ImportSummary};
pub use self::stream::{ImportEvent, import};
