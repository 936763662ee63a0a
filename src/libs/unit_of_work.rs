//! Scoped transactional execution of one logical operation.
//!
//! A [`UnitOfWork`] opens a [`TaskTransaction`], runs the operation body
//! against it and ends the scope exactly once: commit when the body
//! succeeds, rollback when it fails. A panic inside the body drops the
//! transaction, which rolls it back.
//!
//! Mutating scopes emit a [`HistoryEvent`] after the commit. The sink's own
//! failure is logged and never undoes the committed mutation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let task = engine.unit_of_work().mutate(HistoryEventKind::TaskUpdated, &caller, |tx| {
//!     let mut task = tx.load(id)?;
//!     task.is_read = true;
//!     tx.update(&task, expected)?;
//!     Ok(task)
//! })?;
//! ```

use super::access::CallerIdentity;
use super::error::TaskResult;
use super::history::{HistoryEvent, HistoryEventKind, HistoryEventSink};
use super::store::{TaskStore, TaskTransaction};
use super::task::Task;
use tracing::{debug, warn};

pub struct UnitOfWork<'e> {
    store: &'e dyn TaskStore,
    history: &'e dyn HistoryEventSink,
}

impl<'e> UnitOfWork<'e> {
    pub fn new(store: &'e dyn TaskStore, history: &'e dyn HistoryEventSink) -> Self {
        Self { store, history }
    }

    /// Runs `body` in its own transaction; commits on `Ok`, rolls back on `Err`.
    pub fn execute<T, F>(&self, body: F) -> TaskResult<T>
    where
        F: FnOnce(&mut dyn TaskTransaction) -> TaskResult<T>,
    {
        let tx = self.store.begin()?;
        debug!("unit of work opened");
        Self::finish(tx, body)
    }

    /// Runs a body that does not write in a read scope, so it never waits for writers.
    pub fn read<T, F>(&self, body: F) -> TaskResult<T>
    where
        F: FnOnce(&mut dyn TaskTransaction) -> TaskResult<T>,
    {
        let tx = self.store.begin_read()?;
        debug!("read scope opened");
        Self::finish(tx, body)
    }

    fn finish<T, F>(mut tx: Box<dyn TaskTransaction + '_>, body: F) -> TaskResult<T>
    where
        F: FnOnce(&mut dyn TaskTransaction) -> TaskResult<T>,
    {
        match body(tx.as_mut()) {
            Ok(value) => {
                tx.commit()?;
                debug!("unit of work committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                debug!(error = %err, "unit of work rolled back");
                Err(err)
            }
        }
    }

    /// Like [`execute`](Self::execute) and emits `kind` for the returned task after the commit.
    pub fn mutate<F>(&self, kind: HistoryEventKind, actor: &CallerIdentity, body: F) -> TaskResult<Task>
    where
        F: FnOnce(&mut dyn TaskTransaction) -> TaskResult<Task>,
    {
        let task = self.execute(body)?;
        self.emit(HistoryEvent::new(kind, &task.id, actor));
        Ok(task)
    }

    fn emit(&self, event: HistoryEvent) {
        if let Err(err) = self.history.emit(&event) {
            warn!(kind = %event.kind, task_id = %event.task_id, error = %err, "failed to emit history event");
        }
    }
}
