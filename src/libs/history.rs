//! History events emitted after successful mutations.
//!
//! Emission is best effort: a sink that fails is logged and ignored, the
//! mutation it describes stays committed.

use super::access::CallerIdentity;
use super::error::{TaskError, TaskResult};
use super::task::now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventKind {
    TaskCreated,
    TaskUpdated,
    TaskReadFlagChanged,
    TaskClaimed,
    TaskCompleted,
    TaskTransferred,
}

impl HistoryEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEventKind::TaskCreated => "TASK_CREATED",
            HistoryEventKind::TaskUpdated => "TASK_UPDATED",
            HistoryEventKind::TaskReadFlagChanged => "TASK_READ_FLAG_CHANGED",
            HistoryEventKind::TaskClaimed => "TASK_CLAIMED",
            HistoryEventKind::TaskCompleted => "TASK_COMPLETED",
            HistoryEventKind::TaskTransferred => "TASK_TRANSFERRED",
        }
    }
}

impl fmt::Display for HistoryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryEventKind {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TASK_CREATED" => Ok(HistoryEventKind::TaskCreated),
            "TASK_UPDATED" => Ok(HistoryEventKind::TaskUpdated),
            "TASK_READ_FLAG_CHANGED" => Ok(HistoryEventKind::TaskReadFlagChanged),
            "TASK_CLAIMED" => Ok(HistoryEventKind::TaskClaimed),
            "TASK_COMPLETED" => Ok(HistoryEventKind::TaskCompleted),
            "TASK_TRANSFERRED" => Ok(HistoryEventKind::TaskTransferred),
            other => Err(TaskError::invalid(format!("unknown history event kind '{}'", other))),
        }
    }
}

/// Outcome of one committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub kind: HistoryEventKind,
    pub task_id: String,
    pub actor: String,
    pub created: DateTime<Utc>,
}

impl HistoryEvent {
    pub fn new(kind: HistoryEventKind, task_id: &str, actor: &CallerIdentity) -> Self {
        Self {
            kind,
            task_id: task_id.to_string(),
            actor: actor.user_id.clone(),
            created: now(),
        }
    }
}

/// Receiver of history events.
pub trait HistoryEventSink: Send + Sync {
    fn emit(&self, event: &HistoryEvent) -> TaskResult<()>;
}

/// Writes events as structured log records.
#[derive(Debug, Clone, Default)]
pub struct TracingHistory;

impl HistoryEventSink for TracingHistory {
    fn emit(&self, event: &HistoryEvent) -> TaskResult<()> {
        tracing::info!(kind = %event.kind, task_id = %event.task_id, actor = %event.actor, "history event");
        Ok(())
    }
}

/// Drops every event.
#[derive(Debug, Clone, Default)]
pub struct NoHistory;

impl HistoryEventSink for NoHistory {
    fn emit(&self, _event: &HistoryEvent) -> TaskResult<()> {
        Ok(())
    }
}
