#[cfg(test)]
mod tests {
    use basket::libs::access::CallerIdentity;
    use basket::libs::error::{ErrorKind, TaskError, TaskResult};
    use basket::libs::history::{HistoryEvent, HistoryEventKind, HistoryEventSink};
    use basket::libs::store::{TaskQueryItem, TaskStore, TaskTransaction};
    use basket::libs::task::{ObjectReference, Task, TaskState};
    use basket::libs::unit_of_work::UnitOfWork;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how each transaction ended.
    #[derive(Default)]
    struct RecordingStore {
        begun: AtomicUsize,
        committed: AtomicUsize,
        rolled_back: AtomicUsize,
        released: AtomicUsize,
        fail_commit: bool,
    }

    struct RecordingTransaction<'s> {
        store: &'s RecordingStore,
    }

    impl TaskStore for RecordingStore {
        fn begin(&self) -> TaskResult<Box<dyn TaskTransaction + '_>> {
            self.begun.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(RecordingTransaction { store: self }))
        }
    }

    impl Drop for RecordingTransaction<'_> {
        fn drop(&mut self) {
            self.store.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl TaskTransaction for RecordingTransaction<'_> {
        fn load(&mut self, id: &str) -> TaskResult<Task> {
            Err(TaskError::TaskNotFound(id.to_string()))
        }

        fn load_modified(&mut self, _id: &str) -> TaskResult<Option<DateTime<Utc>>> {
            Ok(None)
        }

        fn load_by_object_reference(&mut self, _reference: &ObjectReference) -> TaskResult<Vec<Task>> {
            Ok(Vec::new())
        }

        fn exists(&mut self, _id: &str) -> TaskResult<bool> {
            Ok(false)
        }

        fn insert(&mut self, _task: &Task) -> TaskResult<()> {
            Ok(())
        }

        fn update(&mut self, _task: &Task, _expected_modified: DateTime<Utc>) -> TaskResult<()> {
            Ok(())
        }

        fn count_by_state(&mut self, _domains: Option<&[String]>, _states: Option<&[TaskState]>) -> TaskResult<Vec<TaskQueryItem>> {
            Ok(Vec::new())
        }

        fn commit(self: Box<Self>) -> TaskResult<()> {
            if self.store.fail_commit {
                return Err(TaskError::Database(rusqlite::Error::InvalidQuery));
            }
            self.store.committed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn rollback(self: Box<Self>) -> TaskResult<()> {
            self.store.rolled_back.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingHistory {
        events: Mutex<Vec<HistoryEvent>>,
        fail: bool,
    }

    impl HistoryEventSink for CollectingHistory {
        fn emit(&self, event: &HistoryEvent) -> TaskResult<()> {
            if self.fail {
                return Err(TaskError::Database(rusqlite::Error::InvalidQuery));
            }
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    fn sample_task() -> Task {
        serde_json::from_value(serde_json::json!({
            "id": "TKI:1",
            "name": null,
            "description": null,
            "priority": 1,
            "state": "READY",
            "is_read": false,
            "is_transferred": false,
            "created": "2024-01-01T00:00:00Z",
            "modified": "2024-01-01T00:00:00Z",
            "planned": "2024-01-01T00:00:00Z",
            "claimed": null,
            "completed": null,
            "classification_key": "L10000",
            "classification": { "id": "CLI:1", "key": "L10000", "domain": "DOMAIN_A" },
            "workbasket": { "id": "WBI:1", "key": "USER-1-1", "domain": "DOMAIN_A", "name": null, "owner": null },
            "domain": "DOMAIN_A",
            "owner": null,
            "primary_obj_ref": null,
            "custom_attributes": {},
            "callback_info": {},
            "business_process_id": null,
            "parent_business_process_id": null
        }))
        .unwrap()
    }

    fn ends(store: &RecordingStore) -> (usize, usize, usize, usize) {
        (
            store.begun.load(Ordering::SeqCst),
            store.committed.load(Ordering::SeqCst),
            store.rolled_back.load(Ordering::SeqCst),
            store.released.load(Ordering::SeqCst),
        )
    }

    #[test]
    fn test_success_commits_and_releases_once() {
        let store = RecordingStore::default();
        let history = CollectingHistory::default();

        let value = UnitOfWork::new(&store, &history).execute(|tx| tx.exists("TKI:1")).unwrap();
        assert!(!value);
        assert_eq!(ends(&store), (1, 1, 0, 1));
    }

    #[test]
    fn test_failure_rolls_back_and_releases_once() {
        let store = RecordingStore::default();
        let history = CollectingHistory::default();

        let err = UnitOfWork::new(&store, &history).execute(|tx| tx.load("TKI:missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ends(&store), (1, 0, 1, 1));
    }

    #[test]
    fn test_failed_commit_is_reported_and_releases_once() {
        let store = RecordingStore {
            fail_commit: true,
            ..RecordingStore::default()
        };
        let history = CollectingHistory::default();

        let err = UnitOfWork::new(&store, &history)
            .mutate(HistoryEventKind::TaskUpdated, &CallerIdentity::new("user-1-1", &[]), |_| Ok(sample_task()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
        assert_eq!(store.released.load(Ordering::SeqCst), 1);
        assert!(history.events.lock().is_empty());
    }

    #[test]
    fn test_panic_in_body_releases_once() {
        let store = RecordingStore::default();
        let history = CollectingHistory::default();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            UnitOfWork::new(&store, &history).execute(|_| -> TaskResult<()> { panic!("body failed") })
        }));
        assert!(outcome.is_err());
        assert_eq!(ends(&store), (1, 0, 0, 1));
    }

    #[test]
    fn test_mutation_emits_history_after_commit() {
        let store = RecordingStore::default();
        let history = CollectingHistory::default();
        let caller = CallerIdentity::new("User-1-1", &[]);

        let task = UnitOfWork::new(&store, &history)
            .mutate(HistoryEventKind::TaskClaimed, &caller, |_| Ok(sample_task()))
            .unwrap();

        let events = history.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, HistoryEventKind::TaskClaimed);
        assert_eq!(events[0].task_id, task.id);
        assert_eq!(events[0].actor, "user-1-1");
    }

    #[test]
    fn test_history_failure_keeps_mutation() {
        let store = RecordingStore::default();
        let history = CollectingHistory {
            fail: true,
            ..CollectingHistory::default()
        };

        let task = UnitOfWork::new(&store, &history)
            .mutate(HistoryEventKind::TaskUpdated, &CallerIdentity::new("user-1-1", &[]), |_| Ok(sample_task()))
            .unwrap();
        assert_eq!(task.id, "TKI:1");
        assert_eq!(ends(&store), (1, 1, 0, 1));
    }
}
