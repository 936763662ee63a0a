//! Moving tasks between workbaskets.
//!
//! A transfer needs APPEND on the destination and TRANSFER on the source
//! workbasket. Both checks run inside the same unit of work as the write, so
//! a refused transfer rolls back without touching the task.

use super::auth::WorkbasketPermission;
use super::concurrency::ConcurrencyGuard;
use super::engine::TaskEngine;
use super::error::TaskResult;
use super::history::HistoryEventKind;
use super::task::{next_modified, Task, WorkbasketLocator};
use tracing::info;

pub struct TaskTransferrer<'e> {
    engine: &'e TaskEngine,
}

impl<'e> TaskTransferrer<'e> {
    pub fn new(engine: &'e TaskEngine) -> Self {
        Self { engine }
    }

    pub fn transfer(&self, task_id: &str, destination_workbasket_id: &str) -> TaskResult<Task> {
        self.transfer_to(task_id, &WorkbasketLocator::Id(destination_workbasket_id.to_string()))
    }

    pub fn transfer_by_key(&self, task_id: &str, key: &str, domain: &str) -> TaskResult<Task> {
        self.transfer_to(
            task_id,
            &WorkbasketLocator::KeyDomain {
                key: key.to_string(),
                domain: domain.to_string(),
            },
        )
    }

    /// Moves the task into `destination`, marks it transferred and unread and
    /// puts it back into READY whatever its previous state.
    pub fn transfer_to(&self, task_id: &str, destination: &WorkbasketLocator) -> TaskResult<Task> {
        let caller = self.engine.caller()?;
        self.engine.unit_of_work().mutate(HistoryEventKind::TaskTransferred, &caller, |tx| {
            let mut task = tx.load(task_id)?;
            let destination = self.engine.workbaskets().resolve(destination)?;
            let gate = self.engine.gate();
            gate.check_permission(&caller, &destination, WorkbasketPermission::Append)?;
            gate.check_permission(&caller, &task.workbasket, WorkbasketPermission::Transfer)?;

            let source = task.workbasket.key.clone();
            let observed = task.modified;
            task.move_to(destination);
            task.modified = next_modified(observed);
            ConcurrencyGuard::write(tx, &task, observed)?;

            info!(task_id = %task.id, from = %source, to = %task.workbasket.key, user = %caller.user_id, "task transferred");
            Ok(task)
        })
    }
}
