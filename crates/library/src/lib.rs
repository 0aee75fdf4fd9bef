//! The import and resolution pipeline.
//!
//! - [`scan`] walks a directory tree and streams importable [`Candidate`]s,
//!   peeking inside zip archives and skipping anything already indexed.
//! - [`import`] commits candidates into the [`ManagedRoot`] under a
//!   [`PlacementPolicy`] and records them in the index, compensating the
//!   filesystem step when the index refuses the record.
//! - [`resolve`] turns an indexed record into a [`ServePlan`] and is the
//!   single place that enforces containment before bytes are served.
//! - [`manage`] covers post-import edits, file replacement and deletion.
//!
//! Every operation takes its collaborators explicitly: the managed root, the
//! index [`Repository`] and a [`Context`] holding the classifier and default
//! policy. There is no global state.
//!
//! [`ManagedRoot`]: romshelf_storage::ManagedRoot
//! [`Repository`]: romshelf_index::Repository

mod diagnostic;
pub mod error;
pub mod import;
pub mod manage;
mod placement;
pub mod resolve;
pub mod scan;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use romshelf_classify::Classifier;
use romshelf_config::Config;

pub use crate::diagnostic::{Diagnostic, Level};
pub use crate::import::{FailureKind, ImportEvent, ImportOutcome, ImportStatus, ImportSummary};
pub use crate::manage::{Backing, DeleteOutcome, TitleEdit};
pub use crate::placement::destination_for;
pub use crate::resolve::{ServePlan, ServeTicket};
pub use crate::scan::{Candidate, CandidateKind, ScanEvent, ScanSummary};
pub use romshelf_config::PlacementPolicy;

/// Settings shared by every pipeline stage.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub classifier: Classifier,
    /// Used to predict stored paths when de-duplicating scans.
    pub default_policy: PlacementPolicy,
}

impl Context {
    pub fn new(classifier: Classifier, default_policy: PlacementPolicy) -> Self {
        Self { classifier, default_policy }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = config.classifier().or_raise(|| ErrorKind::Context)?;
        Ok(Self::new(classifier, config.library.default_placement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use romshelf_config::{ClassifierConfig, ExtensionEntry, LibraryConfig};
    use std::path::PathBuf;

    fn config(classifier: ClassifierConfig) -> Config {
        Config {
            library: LibraryConfig {
                root: PathBuf::from("/srv/roms"),
                index: None,
                default_placement: PlacementPolicy::Move,
            },
            classifier,
        }
    }

    #[test]
    fn test_context_from_config() {
        let ctx = Context::from_config(&config(ClassifierConfig::default())).unwrap();
        assert_eq!(ctx.default_policy, PlacementPolicy::Move);
        assert!(ctx.classifier.is_playable("nes"));
    }

    #[test]
    fn test_context_from_custom_table() {
        let classifier = ClassifierConfig {
            extensions: vec![ExtensionEntry { extension: "fds".to_string(), platform: "Famicom Disk System".to_string() }],
            playable: Some(vec![]),
        };
        let ctx = Context::from_config(&config(classifier)).unwrap();
        assert!(ctx.classifier.is_importable("fds"));
        assert!(!ctx.classifier.is_importable("nes"));
        assert!(!ctx.classifier.is_playable("fds"));
    }

    #[test]
    fn test_context_rejects_bad_playable_list() {
        let classifier = ClassifierConfig { extensions: vec![], playable: Some(vec!["exe".to_string()]) };
        let err = Context::from_config(&config(classifier)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Context));
    }
}
