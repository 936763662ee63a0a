//! Persistence and master-data ports consumed by the task core.
//!
//! The core never talks to a database directly. It opens a [`TaskTransaction`]
//! through a [`TaskStore`] and resolves workbaskets and classifications
//! through the lookup traits. `crate::db` provides the SQLite implementations.

use super::error::TaskResult;
use super::task::{ClassificationSummary, ObjectReference, Task, TaskState, WorkbasketLocator, WorkbasketSummary};
use chrono::{DateTime, Utc};

/// One row of the per-domain, per-state task count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQueryItem {
    pub domain: String,
    pub state: TaskState,
    pub count: u64,
}

/// Source of transactional scopes over the persisted tasks.
pub trait TaskStore: Send + Sync {
    /// Acquires a transactional resource for writing. May block until one is available.
    fn begin(&self) -> TaskResult<Box<dyn TaskTransaction + '_>>;

    /// Acquires a scope that only reads. It must not wait for open writers.
    fn begin_read(&self) -> TaskResult<Box<dyn TaskTransaction + '_>> {
        self.begin()
    }
}

/// A transactional scope over the task rows.
///
/// Implementations must roll back when dropped without `commit` or
/// `rollback`, and must release the underlying resource exactly once
/// whichever way the scope ends.
pub trait TaskTransaction {
    /// Loads a task, failing with `TaskNotFound`.
    fn load(&mut self, id: &str) -> TaskResult<Task>;

    /// Reads only the persisted `modified` marker of a task.
    fn load_modified(&mut self, id: &str) -> TaskResult<Option<DateTime<Utc>>>;

    /// Every task whose primary object reference equals `reference`.
    fn load_by_object_reference(&mut self, reference: &ObjectReference) -> TaskResult<Vec<Task>>;

    fn exists(&mut self, id: &str) -> TaskResult<bool>;

    fn insert(&mut self, task: &Task) -> TaskResult<()>;

    /// Writes `task` only if the stored `modified` still equals `expected_modified`.
    ///
    /// Fails with `ConcurrencyConflict` when it does not and with
    /// `TaskNotFound` when the row is gone.
    fn update(&mut self, task: &Task, expected_modified: DateTime<Utc>) -> TaskResult<()>;

    /// Task counts grouped by domain and state, optionally filtered.
    fn count_by_state(&mut self, domains: Option<&[String]>, states: Option<&[TaskState]>) -> TaskResult<Vec<TaskQueryItem>>;

    fn commit(self: Box<Self>) -> TaskResult<()>;

    fn rollback(self: Box<Self>) -> TaskResult<()>;
}

/// Resolves the current snapshot of a workbasket.
pub trait WorkbasketLookup: Send + Sync {
    /// Fails with `WorkbasketNotFound`.
    fn resolve(&self, locator: &WorkbasketLocator) -> TaskResult<WorkbasketSummary>;
}

/// Resolves the current snapshot of a classification.
pub trait ClassificationLookup: Send + Sync {
    /// Fails with `ClassificationNotFound`.
    fn resolve(&self, key: &str, domain: &str) -> TaskResult<ClassificationSummary>;
}
