//! The authoritative, swappable collection of stub records.
//!
//! Records are held as one immutable `Arc<Vec<..>>` behind a lock that is
//! only ever held long enough to clone or swap the reference. A matching
//! pass takes a [`snapshot`](StubRepository::snapshot) and works against
//! that, so a concurrent reload or admin edit can never expose a torn
//! collection: readers see either the fully-old or the fully-new set.
//!
//! Insertion order is preserved and semantically significant — the matcher
//! is first-match-wins over this order.

use crate::error::AdminError;
use crate::stub::StubHttpLifecycle;
use std::sync::{Arc, PoisonError, RwLock};

/// An immutable, momentarily-stable view used for one matching pass.
pub type Snapshot = Arc<Vec<Arc<StubHttpLifecycle>>>;

#[derive(Debug, Default)]
pub struct StubRepository {
    records: RwLock<Snapshot>,
}

impl StubRepository {
    pub fn new() -> Self {
        StubRepository::default()
    }

    pub fn with_records(records: Vec<StubHttpLifecycle>) -> Self {
        let repository = StubRepository::new();
        repository.replace_all(records);
        repository
    }

    /// The current ordered view. Cheap: one `Arc` clone.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.records.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Atomically swap the entire collection. The new collection is fully
    /// built before the swap; in-flight matching passes keep their old
    /// snapshot until they finish.
    pub fn replace_all(&self, records: Vec<StubHttpLifecycle>) {
        let fresh: Snapshot = Arc::new(records.into_iter().map(Arc::new).collect());
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }

    /// Append one record at the end of the matching order.
    pub fn add(&self, record: StubHttpLifecycle) {
        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<Arc<StubHttpLifecycle>> = guard.as_ref().clone();
        next.push(Arc::new(record));
        *guard = Arc::new(next);
    }

    /// Replace the record at `index`, keeping its position in the order.
    pub fn update(&self, index: usize, record: StubHttpLifecycle) -> Result<(), AdminError> {
        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if index >= guard.len() {
            return Err(AdminError::IndexOutOfRange {
                index,
                len: guard.len(),
            });
        }
        let mut next: Vec<Arc<StubHttpLifecycle>> = guard.as_ref().clone();
        next[index] = Arc::new(record);
        *guard = Arc::new(next);
        Ok(())
    }

    /// Remove and return the record at `index`.
    pub fn remove(&self, index: usize) -> Result<Arc<StubHttpLifecycle>, AdminError> {
        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if index >= guard.len() {
            return Err(AdminError::IndexOutOfRange {
                index,
                len: guard.len(),
            });
        }
        let mut next: Vec<Arc<StubHttpLifecycle>> = guard.as_ref().clone();
        let removed = next.remove(index);
        *guard = Arc::new(next);
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubRequest, StubResponse};
    use std::thread;

    fn record(url: &str, body: &str) -> StubHttpLifecycle {
        StubHttpLifecycle::single(StubRequest::for_url(url), StubResponse::new(200, body))
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let repository = StubRepository::with_records(vec![
            record("/a", "a"),
            record("/b", "b"),
            record("/c", "c"),
        ]);

        let bodies: Vec<String> = repository
            .snapshot()
            .iter()
            .map(|r| r.next_response().body)
            .collect();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[test]
    fn snapshot_is_stable_across_replace() {
        let repository = StubRepository::with_records(vec![record("/old", "old")]);

        let snapshot = repository.snapshot();
        repository.replace_all(vec![record("/new", "new1"), record("/new2", "new2")]);

        // The pre-swap view is untouched; a fresh snapshot sees the new set.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].next_response().body, "old");
        assert_eq!(repository.snapshot().len(), 2);
    }

    #[test]
    fn add_appends_at_the_end() {
        let repository = StubRepository::with_records(vec![record("/a", "a")]);
        repository.add(record("/b", "b"));

        let snapshot = repository.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].next_response().body, "b");
    }

    #[test]
    fn update_replaces_in_place() {
        let repository =
            StubRepository::with_records(vec![record("/a", "a"), record("/b", "b")]);

        repository.update(0, record("/a", "patched")).unwrap();

        let snapshot = repository.snapshot();
        assert_eq!(snapshot[0].next_response().body, "patched");
        assert_eq!(snapshot[1].next_response().body, "b");
    }

    #[test]
    fn remove_returns_the_evicted_record() {
        let repository =
            StubRepository::with_records(vec![record("/a", "a"), record("/b", "b")]);

        let removed = repository.remove(0).unwrap();
        assert_eq!(removed.next_response().body, "a");
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn mutations_on_missing_index_report_structured_failure() {
        let repository = StubRepository::with_records(vec![record("/a", "a")]);

        assert_eq!(
            repository.remove(7),
            Err(AdminError::IndexOutOfRange { index: 7, len: 1 })
        );
        assert_eq!(
            repository.update(1, record("/x", "x")).unwrap_err(),
            AdminError::IndexOutOfRange { index: 1, len: 1 }
        );
        // Failed mutations leave the collection untouched.
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn concurrent_readers_never_observe_a_torn_collection() {
        let repository = Arc::new(StubRepository::with_records(vec![
            record("/1", "A"),
            record("/2", "A"),
        ]));

        let reader = {
            let repository = Arc::clone(&repository);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    let snapshot = repository.snapshot();
                    assert_eq!(snapshot.len(), 2);
                    let first = snapshot[0].next_response().body;
                    let second = snapshot[1].next_response().body;
                    // Either fully-old or fully-new, never a mix.
                    assert_eq!(first, second);
                }
            })
        };

        for i in 0..500 {
            let body = if i % 2 == 0 { "B" } else { "A" };
            repository.replace_all(vec![record("/1", body), record("/2", body)]);
        }

        reader.join().unwrap();
    }
}
