//! Best-effort batch update of custom attributes.
//!
//! Candidates are named either by id or by a shared primary object
//! reference. Each candidate then goes through its own unit of work with the
//! same authorization and concurrency guard as a single-task update. A
//! candidate that is refused (not found, not authorized, invalid, stale) is
//! skipped and the batch continues; the result lists the ids that were
//! written, so callers diff it against what they asked for.
//!
//! Only the keys present in the change map are touched. A key mapped to
//! `None` or an empty string clears that attribute.
//!
//! ```text
//! ids / object reference ─▶ candidates ─┬─▶ unit of work (task 1) ─▶ ok   ─┐
//!                                       ├─▶ unit of work (task 2) ─▶ skip ─┼─▶ updated ids
//!                                       └─▶ unit of work (task n) ─▶ ok   ─┘
//! ```

use super::auth::WorkbasketPermission;
use super::engine::TaskEngine;
use super::error::{ErrorKind, TaskResult};
use super::history::HistoryEventKind;
use super::task::{validate_custom_key, ObjectReference};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Custom attribute changes: `Some(value)` sets, `None` or `""` clears.
pub type CustomAttributeChanges = BTreeMap<String, Option<String>>;

pub struct BulkUpdateCoordinator<'e> {
    engine: &'e TaskEngine,
}

impl<'e> BulkUpdateCoordinator<'e> {
    pub fn new(engine: &'e TaskEngine) -> Self {
        Self { engine }
    }

    /// Applies `changes` to every listed task the caller may update.
    pub fn update_tasks_by_id(&self, ids: &[String], changes: &CustomAttributeChanges) -> TaskResult<Vec<String>> {
        validate_changes(changes)?;
        self.apply(ids, changes)
    }

    /// Applies `changes` to every task whose primary object reference equals `reference`.
    pub fn update_tasks_by_object_reference(&self, reference: &ObjectReference, changes: &CustomAttributeChanges) -> TaskResult<Vec<String>> {
        reference.validate()?;
        validate_changes(changes)?;

        let candidates: Vec<String> = self
            .engine
            .unit_of_work()
            .read(|tx| Ok(tx.load_by_object_reference(reference)?.into_iter().map(|task| task.id).collect()))?;
        self.apply(&candidates, changes)
    }

    fn apply(&self, candidates: &[String], changes: &CustomAttributeChanges) -> TaskResult<Vec<String>> {
        let caller = self.engine.caller()?;
        let service = self.engine.task_service();
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut updated = Vec::with_capacity(candidates.len());

        // Each id is written at most once, in first-seen order.
        for id in candidates.iter().filter(|id| seen.insert(*id)) {
            let outcome = self.engine.unit_of_work().mutate(HistoryEventKind::TaskUpdated, &caller, |tx| {
                let persisted = tx.load(id)?;
                self.engine.gate().check_permission(&caller, &persisted.workbasket, WorkbasketPermission::Read)?;
                let mut task = persisted.clone();
                for (key, value) in changes {
                    task.set_custom_attribute(key, value.as_deref())?;
                }
                service.write_update(tx, &caller, &persisted, task, persisted.modified)
            });

            match outcome {
                Ok(task) => updated.push(task.id),
                Err(err) if err.kind() == ErrorKind::PersistenceFailure => return Err(err),
                Err(err) => warn!(task_id = %id, kind = %err.kind(), error = %err, "bulk update skipped task"),
            }
        }

        info!(requested = candidates.len(), updated = updated.len(), user = %caller.user_id, "bulk update finished");
        Ok(updated)
    }
}

fn validate_changes(changes: &CustomAttributeChanges) -> TaskResult<()> {
    changes.keys().try_for_each(|key| validate_custom_key(key))
}
