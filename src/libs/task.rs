//! Task model and its single-task state machine.
//!
//! A [`Task`] is owned by exactly one workbasket, carries a denormalized
//! snapshot of its classification and a mandatory primary object reference
//! linking it to an external business case. The transition helpers here
//! (`claim`, `complete`, `move_to`, `touch`) only change fields; permission
//! checks and persistence are the job of the services in `libs`.
//!
//! ## States
//!
//! ```text
//!            claim            complete
//!   READY ──────────▶ CLAIMED ──────────▶ COMPLETED
//!     ▲                  │                   │
//!     └──── transfer ────┴───────────────────┘
//! ```

use super::error::{TaskError, TaskResult};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix of generated task identifiers.
pub const TASK_ID_PREFIX: &str = "TKI";

/// Prefix of generated business process identifiers.
pub const BUSINESS_PROCESS_ID_PREFIX: &str = "BPI";

/// Highest custom attribute slot; valid keys are `"1"` through `"16"`.
pub const CUSTOM_ATTRIBUTE_SLOTS: u8 = 16;

/// Current time at the precision the store round-trips.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Timestamp for the next successful mutation of a row last touched at `previous`.
///
/// Clocks may tick slower than mutations arrive, so the result is nudged one
/// microsecond past `previous` when the wall clock has not moved.
pub fn next_modified(previous: DateTime<Utc>) -> DateTime<Utc> {
    let current = now();
    if current > previous {
        current
    } else {
        previous + Duration::microseconds(1)
    }
}

pub fn generate_id(prefix: &str) -> String {
    format!("{}:{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Ready,
    Claimed,
    Completed,
}

impl TaskState {
    pub const ALL: [TaskState; 3] = [TaskState::Ready, TaskState::Claimed, TaskState::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Ready => "READY",
            TaskState::Claimed => "CLAIMED",
            TaskState::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "READY" => Ok(TaskState::Ready),
            "CLAIMED" => Ok(TaskState::Claimed),
            "COMPLETED" => Ok(TaskState::Completed),
            other => Err(TaskError::invalid(format!("unknown task state '{}'", other))),
        }
    }
}

/// The business-object key linking a task to an external case.
///
/// Fields are optional so incomplete references can be represented and
/// rejected; a task is only ever persisted with all five present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    pub company: Option<String>,
    pub system: Option<String>,
    pub system_instance: Option<String>,
    #[serde(rename = "type")]
    pub reference_type: Option<String>,
    pub value: Option<String>,
}

impl ObjectReference {
    pub fn new(company: &str, system: &str, system_instance: &str, reference_type: &str, value: &str) -> Self {
        Self {
            company: Some(company.to_string()),
            system: Some(system.to_string()),
            system_instance: Some(system_instance.to_string()),
            reference_type: Some(reference_type.to_string()),
            value: Some(value.to_string()),
        }
    }

    /// Fails with `InvalidArgument` naming the first missing field.
    pub fn validate(&self) -> TaskResult<()> {
        let fields = [
            ("company", &self.company),
            ("system", &self.system),
            ("systemInstance", &self.system_instance),
            ("type", &self.reference_type),
            ("value", &self.value),
        ];
        for (name, field) in fields {
            if field.is_none() {
                return Err(TaskError::invalid(format!("primary object reference is missing '{}'", name)));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |field: &Option<String>| field.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}/{}/{}/{}/{}",
            part(&self.company),
            part(&self.system),
            part(&self.system_instance),
            part(&self.reference_type),
            part(&self.value)
        )
    }
}

/// Snapshot of a classification taken when it was bound to a task.
///
/// Two summaries are the same when every field matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSummary {
    pub id: String,
    pub key: String,
    pub category: Option<String>,
    pub classification_type: Option<String>,
    pub domain: String,
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_key: Option<String>,
    pub priority: i32,
    pub service_level: Option<String>,
    pub custom: [Option<String>; 8],
}

/// Snapshot of the workbasket that owns a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkbasketSummary {
    pub id: String,
    pub key: String,
    pub domain: String,
    pub name: Option<String>,
    pub owner: Option<String>,
}

/// How a caller names a workbasket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkbasketLocator {
    Id(String),
    KeyDomain { key: String, domain: String },
}

impl fmt::Display for WorkbasketLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkbasketLocator::Id(id) => write!(f, "{}", id),
            WorkbasketLocator::KeyDomain { key, domain } => write!(f, "{}@{}", key, domain),
        }
    }
}

/// Checks that `key` names one of the custom attribute slots.
pub fn validate_custom_key(key: &str) -> TaskResult<()> {
    match key.parse::<u8>() {
        Ok(slot) if (1..=CUSTOM_ATTRIBUTE_SLOTS).contains(&slot) && key.bytes().all(|b| b.is_ascii_digit()) && !key.starts_with('0') => {
            Ok(())
        }
        _ => Err(TaskError::invalid(format!(
            "custom attribute key '{}' is not one of 1..{}",
            key, CUSTOM_ATTRIBUTE_SLOTS
        ))),
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// Caller-chosen id; generated when absent.
    pub id: Option<String>,
    pub workbasket: WorkbasketLocator,
    pub classification_key: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub primary_obj_ref: Option<ObjectReference>,
    pub custom_attributes: BTreeMap<String, String>,
    pub callback_info: BTreeMap<String, String>,
    pub business_process_id: Option<String>,
    pub parent_business_process_id: Option<String>,
}

impl NewTask {
    pub fn new(workbasket: WorkbasketLocator, classification_key: &str) -> Self {
        Self {
            id: None,
            workbasket,
            classification_key: classification_key.to_string(),
            name: None,
            description: None,
            primary_obj_ref: None,
            custom_attributes: BTreeMap::new(),
            callback_info: BTreeMap::new(),
            business_process_id: None,
            parent_business_process_id: None,
        }
    }

    pub fn with_primary_obj_ref(mut self, reference: ObjectReference) -> Self {
        self.primary_obj_ref = Some(reference);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// A persisted work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: i32,
    pub state: TaskState,
    pub is_read: bool,
    pub is_transferred: bool,
    pub created: DateTime<Utc>,
    /// Version marker for optimistic concurrency; send back what was read.
    pub modified: DateTime<Utc>,
    pub planned: DateTime<Utc>,
    pub claimed: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    /// Key the caller wants; the summary below is recomputed when it changes.
    pub classification_key: String,
    pub classification: ClassificationSummary,
    pub workbasket: WorkbasketSummary,
    pub domain: String,
    pub owner: Option<String>,
    pub primary_obj_ref: Option<ObjectReference>,
    pub custom_attributes: BTreeMap<String, String>,
    pub callback_info: BTreeMap<String, String>,
    pub business_process_id: Option<String>,
    pub parent_business_process_id: Option<String>,
}

impl Task {
    /// Builds a READY task from validated creation input and resolved master data.
    pub fn from_new(
        new_task: NewTask,
        id: String,
        workbasket: WorkbasketSummary,
        classification: ClassificationSummary,
        created: DateTime<Utc>,
    ) -> Self {
        Task {
            id,
            name: new_task.name,
            description: new_task.description,
            priority: classification.priority,
            state: TaskState::Ready,
            is_read: false,
            is_transferred: false,
            created,
            modified: created,
            planned: created,
            claimed: None,
            completed: None,
            classification_key: classification.key.clone(),
            classification,
            domain: workbasket.domain.clone(),
            workbasket,
            owner: None,
            primary_obj_ref: new_task.primary_obj_ref,
            custom_attributes: new_task.custom_attributes,
            callback_info: new_task.callback_info,
            business_process_id: new_task
                .business_process_id
                .or_else(|| Some(generate_id(BUSINESS_PROCESS_ID_PREFIX))),
            parent_business_process_id: new_task.parent_business_process_id,
        }
    }

    pub fn custom_attribute(&self, key: &str) -> Option<&str> {
        self.custom_attributes.get(key).map(String::as_str)
    }

    /// Sets or clears (`None` or empty) one custom attribute slot.
    pub fn set_custom_attribute(&mut self, key: &str, value: Option<&str>) -> TaskResult<()> {
        validate_custom_key(key)?;
        match value {
            Some(value) if !value.is_empty() => {
                self.custom_attributes.insert(key.to_string(), value.to_string());
            }
            _ => {
                self.custom_attributes.remove(key);
            }
        }
        Ok(())
    }

    /// Advances `modified` for a successful mutation.
    pub fn touch(&mut self) {
        self.modified = next_modified(self.modified);
    }

    pub fn claim(&mut self, user_id: &str, at: DateTime<Utc>) -> TaskResult<()> {
        match self.state {
            TaskState::Ready => {
                self.state = TaskState::Claimed;
                self.owner = Some(user_id.to_string());
                self.claimed = Some(at);
                self.is_read = true;
                Ok(())
            }
            TaskState::Claimed if self.owner.as_deref() == Some(user_id) => Ok(()),
            TaskState::Claimed => Err(TaskError::invalid_state(&self.id, "task is claimed by another user")),
            TaskState::Completed => Err(TaskError::invalid_state(&self.id, "task is already completed")),
        }
    }

    pub fn complete(&mut self, user_id: &str, at: DateTime<Utc>) -> TaskResult<()> {
        match self.state {
            TaskState::Claimed if self.owner.as_deref() == Some(user_id) => {
                self.state = TaskState::Completed;
                self.completed = Some(at);
                Ok(())
            }
            TaskState::Completed => Ok(()),
            TaskState::Claimed => Err(TaskError::invalid_state(&self.id, "task is claimed by another user")),
            TaskState::Ready => Err(TaskError::invalid_state(&self.id, "task must be claimed before completion")),
        }
    }

    /// Moves the task into `destination` and back into the ready pool.
    pub fn move_to(&mut self, destination: WorkbasketSummary) {
        self.domain = destination.domain.clone();
        self.workbasket = destination;
        self.is_transferred = true;
        self.is_read = false;
        self.state = TaskState::Ready;
        self.owner = None;
        self.claimed = None;
        self.completed = None;
    }
}
