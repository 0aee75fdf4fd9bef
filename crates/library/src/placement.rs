use crate::PlacementPolicy;
use crate::scan::{Candidate, CandidateKind};
use romshelf_storage::ManagedRoot;
use romshelf_storage::error::Result as StorageResult;
use std::path::PathBuf;

/// Where `candidate` ends up when imported under `policy`.
///
/// - Archives always extract to `<root>/<platform>/<archive stem>`, whatever
///   the policy.
/// - Copied and moved files land at `<root>/<platform>/<file name>`.
/// - Referenced files stay where they are.
///
/// This is the value the record's `stored_path` will hold, which is what the
/// scanner compares against the index.
pub fn destination_for(store: &ManagedRoot, candidate: &Candidate, policy: PlacementPolicy) -> StorageResult<PathBuf> {
    let platform = candidate.platform.as_str();
    match (&candidate.kind, policy) {
        (CandidateKind::Archive { .. }, _) => Ok(store.title_dir(platform, &candidate.archive_stem())),
        (CandidateKind::SingleFile, PlacementPolicy::ReferenceInPlace) => Ok(candidate.source_path.clone()),
        (CandidateKind::SingleFile, PlacementPolicy::Copy | PlacementPolicy::Move) => {
            store.file_destination(platform, &candidate.source_filename())
        },
    }
}
