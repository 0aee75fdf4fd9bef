//! From an indexed record to bytes that are safe to serve.
//!
//! [`resolve`] decides which concrete file stands for a record and whether it
//! is playable in the browser; [`authorize`] is the full check sequence an
//! HTTP handler runs before streaming. Both refuse anything that resolves
//! outside the managed root, symlinks included.

pub mod error;
mod plan;
mod serve;

pub use self::plan::{ServePlan, resolve, resolve_by_id};
pub use self::serve::{ServeTicket, authorize};
