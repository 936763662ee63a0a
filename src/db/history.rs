//! History events persisted to the `history_events` table.

use super::db::Db;
use crate::libs::error::TaskResult;
use crate::libs::history::{HistoryEvent, HistoryEventKind, HistoryEventSink};
use rusqlite::params;
use std::str::FromStr;

const INSERT_EVENT: &str = "INSERT INTO history_events (kind, task_id, actor, created) VALUES (?1, ?2, ?3, ?4)";
const SELECT_EVENTS_FOR_TASK: &str = "SELECT kind, task_id, actor, created FROM history_events WHERE task_id = ?1 ORDER BY id";

#[derive(Clone)]
pub struct SqliteHistory {
    db: Db,
}

impl SqliteHistory {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Events recorded for `task_id`, oldest first.
    pub fn events_for(&self, task_id: &str) -> TaskResult<Vec<HistoryEvent>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(SELECT_EVENTS_FOR_TASK)?;
        let rows = stmt.query_map(params![task_id], |row| {
            let kind: String = row.get(0)?;
            Ok(HistoryEvent {
                kind: HistoryEventKind::from_str(&kind)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?,
                task_id: row.get(1)?,
                actor: row.get(2)?,
                created: row.get(3)?,
            })
        })?;
        let mut events = Vec::new();
        for event in rows {
            events.push(event?);
        }
        Ok(events)
    }
}

impl HistoryEventSink for SqliteHistory {
    fn emit(&self, event: &HistoryEvent) -> TaskResult<()> {
        self.db
            .connection()?
            .execute(INSERT_EVENT, params![event.kind.as_str(), event.task_id, event.actor, event.created])?;
        Ok(())
    }
}
