use crate::PlacementPolicy;
use crate::import::{ImportOutcome, ImportSummary, import_candidate};
use crate::scan::Candidate;
use async_stream::stream;
use futures::Stream;
use romshelf_index::Repository;
use romshelf_storage::ManagedRoot;

/// Progress events emitted by [`import`].
///
/// [`Started`](Self::Started) once, one [`Processed`](Self::Processed) per
/// candidate in input order, then [`Complete`](Self::Complete) once.
#[derive(Debug)]
pub enum ImportEvent {
    Started { total: u64 },
    Processed(ImportOutcome),
    Complete(ImportSummary),
}

/// Import `candidates` sequentially under `policy`.
///
/// A failing candidate is reported in its own outcome and processing moves
/// on to the next one. Dropping the stream stops after the candidate in
/// flight.
pub fn import<'a>(
    store: &'a ManagedRoot,
    index: &'a Repository,
    candidates: impl IntoIterator<Item = Candidate>,
    policy: PlacementPolicy,
) -> impl Stream<Item = ImportEvent> + 'a {
    let candidates: Vec<Candidate> = candidates.into_iter().collect();
    stream!({
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield ImportEvent::Started { total: u64::try_from(candidates.len()).unwrap_or(u64::MAX) };
        tracing::info!(total = candidates.len(), %policy, "Importing");

        let mut summary = ImportSummary::default();
        for candidate in &candidates {
            let outcome = import_candidate(store, index, candidate, policy).await;
            match outcome.is_success() {
                true => summary.imported += 1,
                false => summary.failed += 1,
            }
            yield ImportEvent::Processed(outcome);
        }

        tracing::info!(imported = summary.imported, failed = summary.failed, "Import complete");
        yield ImportEvent::Complete(summary);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::FailureKind;
    use futures::StreamExt;
    use romshelf_index::Database;

    #[tokio::test]
    async fn test_events_follow_input_order() {
        let temp = tempfile::tempdir().unwrap();
        let store = ManagedRoot::new(temp.path().join("library")).unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        let index = Repository::from(&db);
        let good = temp.path().join("good.nes");
        std::fs::write(&good, b"NES").unwrap();
        let candidates = vec![
            Candidate::file(&good, "Good", "Nintendo Entertainment System", 3),
            Candidate::file(temp.path().join("missing.nes"), "Missing", "Nintendo Entertainment System", 3),
        ];

        let events: Vec<_> = import(&store, &index, candidates, PlacementPolicy::Copy).collect().await;
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], ImportEvent::Started { total: 2 }));
        match &events[1] {
            ImportEvent::Processed(outcome) => assert!(outcome.is_success()),
            other => panic!("unexpected event {other:?}"),
        }
        match &events[2] {
            ImportEvent::Processed(outcome) => assert_eq!(outcome.error_kind(), Some(FailureKind::Io)),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(events[3], ImportEvent::Complete(ImportSummary { imported: 1, failed: 1 })));
    }
}
