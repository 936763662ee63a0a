//! SQLite implementation of the task store.
//!
//! Every transaction runs on its own pooled connection. Writing scopes start
//! with `BEGIN IMMEDIATE`, so the write lock is taken up front and two writers
//! never both read a row and then race to update it. Reading scopes start
//! with `BEGIN DEFERRED` and, in WAL mode, see the last committed snapshot
//! without waiting for writers. Updates are conditional on the `modified`
//! value the caller observed.

use super::db::{Db, PooledConnection};
use crate::libs::error::{TaskError, TaskResult};
use crate::libs::store::{TaskQueryItem, TaskStore, TaskTransaction};
use crate::libs::task::{ObjectReference, Task, TaskState, WorkbasketSummary};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::str::FromStr;
use tracing::{debug, warn};

const TASK_COLUMNS: &str = "id, name, description, priority, state, is_read, is_transferred, created, modified, planned, claimed, completed, \
     classification_key, classification, workbasket_id, workbasket_key, workbasket_name, workbasket_owner, domain, owner, \
     por_company, por_system, por_system_instance, por_type, por_value, custom_attributes, callback_info, \
     business_process_id, parent_business_process_id";

const INSERT_TASK: &str = "INSERT INTO tasks (id, name, description, priority, state, is_read, is_transferred, created, modified, planned, claimed, completed, \
     classification_key, classification, workbasket_id, workbasket_key, workbasket_name, workbasket_owner, domain, owner, \
     por_company, por_system, por_system_instance, por_type, por_value, custom_attributes, callback_info, \
     business_process_id, parent_business_process_id) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)";

/// `?1` is the id, `?30` the `modified` value the writer observed.
const UPDATE_TASK: &str = "UPDATE tasks SET name = ?2, description = ?3, priority = ?4, state = ?5, is_read = ?6, is_transferred = ?7, \
     created = ?8, modified = ?9, planned = ?10, claimed = ?11, completed = ?12, classification_key = ?13, classification = ?14, \
     workbasket_id = ?15, workbasket_key = ?16, workbasket_name = ?17, workbasket_owner = ?18, domain = ?19, owner = ?20, \
     por_company = ?21, por_system = ?22, por_system_instance = ?23, por_type = ?24, por_value = ?25, custom_attributes = ?26, \
     callback_info = ?27, business_process_id = ?28, parent_business_process_id = ?29 \
     WHERE id = ?1 AND modified = ?30";

const SELECT_MODIFIED: &str = "SELECT modified FROM tasks WHERE id = ?1";
const SELECT_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)";
const WHERE_ID: &str = "WHERE id = ?1";
const WHERE_OBJECT_REFERENCE: &str =
    "WHERE por_company = ?1 AND por_system = ?2 AND por_system_instance = ?3 AND por_type = ?4 AND por_value = ?5 ORDER BY created, id";
const COUNT_BY_STATE: &str = "SELECT domain, state, COUNT(*) FROM tasks";
const GROUP_BY_DOMAIN_STATE: &str = "GROUP BY domain, state ORDER BY domain, state";

#[derive(Clone)]
pub struct SqliteTaskStore {
    db: Db,
}

impl SqliteTaskStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl SqliteTaskStore {
    fn open(&self, begin: &str) -> TaskResult<Box<dyn TaskTransaction + '_>> {
        let conn = self.db.connection()?;
        conn.execute_batch(begin)?;
        Ok(Box::new(SqliteTransaction { conn, open: true }))
    }
}

impl TaskStore for SqliteTaskStore {
    fn begin(&self) -> TaskResult<Box<dyn TaskTransaction + '_>> {
        self.open("BEGIN IMMEDIATE")
    }

    fn begin_read(&self) -> TaskResult<Box<dyn TaskTransaction + '_>> {
        self.open("BEGIN DEFERRED")
    }
}

/// One `BEGIN` .. `COMMIT`/`ROLLBACK` scope.
pub struct SqliteTransaction<'p> {
    conn: PooledConnection<'p>,
    open: bool,
}

impl SqliteTransaction<'_> {
    fn select(&self, clause: &str) -> String {
        format!("SELECT {} FROM tasks {}", TASK_COLUMNS, clause)
    }
}

impl TaskTransaction for SqliteTransaction<'_> {
    fn load(&mut self, id: &str) -> TaskResult<Task> {
        self.conn
            .query_row(&self.select(WHERE_ID), params![id], parse_task_row)
            .optional()?
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
    }

    fn load_modified(&mut self, id: &str) -> TaskResult<Option<DateTime<Utc>>> {
        Ok(self.conn.query_row(SELECT_MODIFIED, params![id], |row| row.get(0)).optional()?)
    }

    fn load_by_object_reference(&mut self, reference: &ObjectReference) -> TaskResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&self.select(WHERE_OBJECT_REFERENCE))?;
        let rows = stmt.query_map(
            params![
                reference.company,
                reference.system,
                reference.system_instance,
                reference.reference_type,
                reference.value
            ],
            parse_task_row,
        )?;
        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    fn exists(&mut self, id: &str) -> TaskResult<bool> {
        Ok(self.conn.query_row(SELECT_EXISTS, params![id], |row| row.get(0))?)
    }

    fn insert(&mut self, task: &Task) -> TaskResult<()> {
        let row = TaskRow::encode(task)?;
        self.conn.execute(
            INSERT_TASK,
            params![
                task.id,
                task.name,
                task.description,
                task.priority,
                task.state.as_str(),
                task.is_read,
                task.is_transferred,
                task.created,
                task.modified,
                task.planned,
                task.claimed,
                task.completed,
                task.classification_key,
                row.classification,
                task.workbasket.id,
                task.workbasket.key,
                task.workbasket.name,
                task.workbasket.owner,
                task.domain,
                task.owner,
                row.reference.company,
                row.reference.system,
                row.reference.system_instance,
                row.reference.reference_type,
                row.reference.value,
                row.custom_attributes,
                row.callback_info,
                task.business_process_id,
                task.parent_business_process_id,
            ],
        )?;
        debug!(task_id = %task.id, "inserted task row");
        Ok(())
    }

    fn update(&mut self, task: &Task, expected_modified: DateTime<Utc>) -> TaskResult<()> {
        let row = TaskRow::encode(task)?;
        let changed = self.conn.execute(
            UPDATE_TASK,
            params![
                task.id,
                task.name,
                task.description,
                task.priority,
                task.state.as_str(),
                task.is_read,
                task.is_transferred,
                task.created,
                task.modified,
                task.planned,
                task.claimed,
                task.completed,
                task.classification_key,
                row.classification,
                task.workbasket.id,
                task.workbasket.key,
                task.workbasket.name,
                task.workbasket.owner,
                task.domain,
                task.owner,
                row.reference.company,
                row.reference.system,
                row.reference.system_instance,
                row.reference.reference_type,
                row.reference.value,
                row.custom_attributes,
                row.callback_info,
                task.business_process_id,
                task.parent_business_process_id,
                expected_modified,
            ],
        )?;

        if changed == 0 {
            return if self.exists(&task.id)? {
                Err(TaskError::ConcurrencyConflict { task_id: task.id.clone() })
            } else {
                Err(TaskError::TaskNotFound(task.id.clone()))
            };
        }
        debug!(task_id = %task.id, "updated task row");
        Ok(())
    }

    fn count_by_state(&mut self, domains: Option<&[String]>, states: Option<&[TaskState]>) -> TaskResult<Vec<TaskQueryItem>> {
        let mut conditions = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(domains) = domains.filter(|d| !d.is_empty()) {
            conditions.push(format!("domain IN ({})", vec!["?"; domains.len()].join(", ")));
            values.extend(domains.iter().cloned());
        }
        if let Some(states) = states.filter(|s| !s.is_empty()) {
            conditions.push(format!("state IN ({})", vec!["?"; states.len()].join(", ")));
            values.extend(states.iter().map(|state| state.as_str().to_string()));
        }

        let sql = if conditions.is_empty() {
            format!("{} {}", COUNT_BY_STATE, GROUP_BY_DOMAIN_STATE)
        } else {
            format!("{} WHERE {} {}", COUNT_BY_STATE, conditions.join(" AND "), GROUP_BY_DOMAIN_STATE)
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(TaskQueryItem {
                domain: row.get(0)?,
                state: parse_state(row, 1)?,
                count: row.get::<_, i64>(2)? as u64,
            })
        })?;
        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    fn commit(mut self: Box<Self>) -> TaskResult<()> {
        self.open = false;
        if let Err(err) = self.conn.execute_batch("COMMIT") {
            if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %rollback_err, "rollback after failed commit also failed");
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> TaskResult<()> {
        self.open = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "rollback of abandoned transaction failed");
            }
        }
    }
}

/// Column values of a task that need encoding before they are bound.
struct TaskRow {
    classification: String,
    reference: ObjectReference,
    custom_attributes: String,
    callback_info: String,
}

impl TaskRow {
    fn encode(task: &Task) -> TaskResult<Self> {
        let reference = match &task.primary_obj_ref {
            Some(reference) => {
                reference.validate()?;
                reference.clone()
            }
            None => return Err(TaskError::invalid("primary object reference is required")),
        };
        Ok(Self {
            classification: serde_json::to_string(&task.classification)?,
            reference,
            custom_attributes: serde_json::to_string(&task.custom_attributes)?,
            callback_info: serde_json::to_string(&task.callback_info)?,
        })
    }
}

fn conversion_failure(index: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn parse_state(row: &Row, index: usize) -> rusqlite::Result<TaskState> {
    let raw: String = row.get(index)?;
    TaskState::from_str(&raw).map_err(|e| conversion_failure(index, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(row: &Row, index: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    serde_json::from_str(&raw).map_err(|e| conversion_failure(index, e))
}

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        priority: row.get(3)?,
        state: parse_state(row, 4)?,
        is_read: row.get(5)?,
        is_transferred: row.get(6)?,
        created: row.get(7)?,
        modified: row.get(8)?,
        planned: row.get(9)?,
        claimed: row.get(10)?,
        completed: row.get(11)?,
        classification_key: row.get(12)?,
        classification: parse_json(row, 13)?,
        workbasket: WorkbasketSummary {
            id: row.get(14)?,
            key: row.get(15)?,
            name: row.get(16)?,
            owner: row.get(17)?,
            domain: row.get(18)?,
        },
        domain: row.get(18)?,
        owner: row.get(19)?,
        primary_obj_ref: Some(ObjectReference {
            company: row.get(20)?,
            system: row.get(21)?,
            system_instance: row.get(22)?,
            reference_type: row.get(23)?,
            value: row.get(24)?,
        }),
        custom_attributes: parse_json(row, 25)?,
        callback_info: parse_json(row, 26)?,
        business_process_id: row.get(27)?,
        parent_business_process_id: row.get(28)?,
    })
}
