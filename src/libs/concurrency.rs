//! Optimistic concurrency control on the `modified` marker.
//!
//! Callers send back the `modified` value they last read. Inside the write's
//! transaction the guard re-reads the persisted marker and refuses the write
//! when they differ. The first committed writer wins; later writers carrying
//! the old marker get `ConcurrencyConflict` and must reload. There is no
//! merge and no automatic retry.

use super::error::{TaskError, TaskResult};
use super::store::TaskTransaction;
use super::task::Task;
use chrono::{DateTime, Utc};
use tracing::debug;

pub struct ConcurrencyGuard;

impl ConcurrencyGuard {
    /// Compares the persisted marker of `task_id` with `observed`.
    pub fn verify(tx: &mut dyn TaskTransaction, task_id: &str, observed: DateTime<Utc>) -> TaskResult<()> {
        match tx.load_modified(task_id)? {
            None => Err(TaskError::TaskNotFound(task_id.to_string())),
            Some(persisted) if persisted == observed => Ok(()),
            Some(persisted) => {
                debug!(task_id, %observed, %persisted, "stale write rejected");
                Err(TaskError::ConcurrencyConflict { task_id: task_id.to_string() })
            }
        }
    }

    /// Verifies `observed` and writes `task` conditionally on it.
    pub fn write(tx: &mut dyn TaskTransaction, task: &Task, observed: DateTime<Utc>) -> TaskResult<()> {
        Self::verify(tx, &task.id, observed)?;
        tx.update(task, observed)
    }
}
