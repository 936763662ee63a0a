//! Single-task operations: get, create, update, read flag, claim, complete.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! caller identity ─▶ authorization ─▶ unit of work ─▶ load / validate
//!                                                   ─▶ guarded write ─▶ commit ─▶ history event
//! ```
//!
//! Workbasket permissions are checked against the workbasket that owns the
//! task as persisted, never against what the caller sent.

use super::access::CallerIdentity;
use super::auth::WorkbasketPermission;
use super::concurrency::ConcurrencyGuard;
use super::engine::TaskEngine;
use super::error::{TaskError, TaskResult};
use super::history::HistoryEventKind;
use super::store::TaskTransaction;
use super::task::{self, generate_id, next_modified, validate_custom_key, NewTask, Task, TaskState, TASK_ID_PREFIX};
use chrono::{DateTime, Utc};
use tracing::info;

pub struct TaskService<'e> {
    engine: &'e TaskEngine,
}

impl<'e> TaskService<'e> {
    pub fn new(engine: &'e TaskEngine) -> Self {
        Self { engine }
    }

    /// Loads a task the caller may READ.
    pub fn get_task(&self, id: &str) -> TaskResult<Task> {
        let caller = self.engine.caller()?;
        self.engine.unit_of_work().read(|tx| {
            let task = tx.load(id)?;
            self.engine.gate().check_permission(&caller, &task.workbasket, WorkbasketPermission::Read)?;
            Ok(task)
        })
    }

    /// Creates a READY task in the workbasket named by `new_task`.
    ///
    /// Requires APPEND on that workbasket. The classification is resolved in
    /// the workbasket's domain and supplies the priority.
    pub fn create_task(&self, new_task: NewTask) -> TaskResult<Task> {
        let caller = self.engine.caller()?;

        new_task
            .primary_obj_ref
            .as_ref()
            .ok_or_else(|| TaskError::invalid("primary object reference is mandatory"))?
            .validate()?;
        for key in new_task.custom_attributes.keys() {
            validate_custom_key(key)?;
        }

        let workbasket = self.engine.workbaskets().resolve(&new_task.workbasket)?;
        self.engine.gate().check_permission(&caller, &workbasket, WorkbasketPermission::Append)?;
        let classification = self.engine.classifications().resolve(&new_task.classification_key, &workbasket.domain)?;

        self.engine.unit_of_work().mutate(HistoryEventKind::TaskCreated, &caller, |tx| {
            let id = match &new_task.id {
                Some(id) if tx.exists(id)? => return Err(TaskError::AlreadyExists(id.clone())),
                Some(id) => id.clone(),
                None => generate_id(TASK_ID_PREFIX),
            };
            let task = Task::from_new(new_task, id, workbasket, classification, task::now());
            tx.insert(&task)?;
            info!(task_id = %task.id, workbasket = %task.workbasket.key, user = %caller.user_id, "task created");
            Ok(task)
        })
    }

    /// Writes the caller's copy of a task back.
    ///
    /// `task.modified` must still equal the persisted value, otherwise the
    /// write is refused with `ConcurrencyConflict`. A stale copy is reported
    /// as a conflict before its fields are validated.
    pub fn update_task(&self, task: Task) -> TaskResult<Task> {
        let caller = self.engine.caller()?;
        self.engine.unit_of_work().mutate(HistoryEventKind::TaskUpdated, &caller, |tx| {
            let persisted = tx.load(&task.id)?;
            self.engine.gate().check_permission(&caller, &persisted.workbasket, WorkbasketPermission::Read)?;
            let observed = task.modified;
            ConcurrencyGuard::verify(tx, &task.id, observed)?;
            self.write_update(tx, &caller, &persisted, task, observed)
        })
    }

    pub fn set_task_read(&self, id: &str, is_read: bool) -> TaskResult<Task> {
        self.modify(HistoryEventKind::TaskReadFlagChanged, id, |task, _, at| {
            task.is_read = is_read;
            task.modified = at;
            Ok(())
        })
    }

    /// READY → CLAIMED with the caller as owner.
    pub fn claim(&self, id: &str) -> TaskResult<Task> {
        self.modify(HistoryEventKind::TaskClaimed, id, |task, caller, at| {
            task.claim(&caller.user_id, at)?;
            task.modified = at;
            Ok(())
        })
    }

    /// CLAIMED by the caller → COMPLETED.
    pub fn complete(&self, id: &str) -> TaskResult<Task> {
        self.modify(HistoryEventKind::TaskCompleted, id, |task, caller, at| {
            task.complete(&caller.user_id, at)?;
            task.modified = at;
            Ok(())
        })
    }

    /// Validates `task` against `persisted` and writes it guarded by `observed`.
    pub(crate) fn write_update(
        &self,
        tx: &mut dyn TaskTransaction,
        caller: &CallerIdentity,
        persisted: &Task,
        mut task: Task,
        observed: DateTime<Utc>,
    ) -> TaskResult<Task> {
        self.prepare_update(persisted, &mut task)?;
        task.modified = next_modified(persisted.modified);
        ConcurrencyGuard::write(tx, &task, observed)?;
        info!(task_id = %task.id, user = %caller.user_id, "task updated");
        Ok(task)
    }

    fn prepare_update(&self, persisted: &Task, task: &mut Task) -> TaskResult<()> {
        if self.engine.policy().lock_completed_tasks && persisted.state == TaskState::Completed {
            return Err(TaskError::invalid_state(&task.id, "completed tasks cannot be updated"));
        }
        task.primary_obj_ref
            .as_ref()
            .ok_or_else(|| TaskError::invalid("primary object reference is mandatory"))?
            .validate()?;
        if task.workbasket.key != persisted.workbasket.key || task.workbasket.id != persisted.workbasket.id {
            return Err(TaskError::invalid("the workbasket of a task can only be changed by a transfer"));
        }
        if task.created != persisted.created {
            return Err(TaskError::invalid("the creation timestamp of a task cannot be changed"));
        }
        for key in task.custom_attributes.keys() {
            validate_custom_key(key)?;
        }

        // Lifecycle fields only move through claim, complete, transfer and the read flag.
        task.state = persisted.state;
        task.is_read = persisted.is_read;
        task.owner = persisted.owner.clone();
        task.claimed = persisted.claimed;
        task.completed = persisted.completed;
        task.is_transferred = persisted.is_transferred;
        task.workbasket = persisted.workbasket.clone();
        task.domain = persisted.domain.clone();

        if task.classification_key != persisted.classification.key {
            let classification = self.engine.classifications().resolve(&task.classification_key, &persisted.domain)?;
            task.priority = classification.priority;
            task.classification = classification;
        } else {
            task.classification = persisted.classification.clone();
        }
        Ok(())
    }

    /// Narrow mutation of a loaded task under READ permission.
    fn modify<F>(&self, kind: HistoryEventKind, id: &str, change: F) -> TaskResult<Task>
    where
        F: FnOnce(&mut Task, &CallerIdentity, DateTime<Utc>) -> TaskResult<()>,
    {
        let caller = self.engine.caller()?;
        self.engine.unit_of_work().mutate(kind, &caller, |tx| {
            let mut task = tx.load(id)?;
            self.engine.gate().check_permission(&caller, &task.workbasket, WorkbasketPermission::Read)?;
            let observed = task.modified;
            change(&mut task, &caller, next_modified(observed))?;
            ConcurrencyGuard::write(tx, &task, observed)?;
            info!(task_id = %task.id, user = %caller.user_id, %kind, "task modified");
            Ok(task)
        })
    }
}
