//! Workbasket master data.

use super::db::Db;
use crate::libs::error::{TaskError, TaskResult};
use crate::libs::store::WorkbasketLookup;
use crate::libs::task::{WorkbasketLocator, WorkbasketSummary};
use rusqlite::{params, OptionalExtension, Row};

const SELECT_BY_ID: &str = "SELECT id, key, domain, name, owner FROM workbaskets WHERE id = ?1";
const SELECT_BY_KEY: &str = "SELECT id, key, domain, name, owner FROM workbaskets WHERE key = ?1 AND domain = ?2";
pub(super) const UPSERT_WORKBASKET: &str = "INSERT INTO workbaskets (id, key, domain, name, owner) VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT(id) DO UPDATE SET key = excluded.key, domain = excluded.domain, name = excluded.name, owner = excluded.owner";

#[derive(Clone)]
pub struct SqliteWorkbaskets {
    db: Db,
}

impl SqliteWorkbaskets {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Inserts the workbasket or replaces the one with the same id.
    pub fn upsert(&self, workbasket: &WorkbasketSummary) -> TaskResult<()> {
        self.db.connection()?.execute(
            UPSERT_WORKBASKET,
            params![workbasket.id, workbasket.key, workbasket.domain, workbasket.name, workbasket.owner],
        )?;
        Ok(())
    }
}

impl WorkbasketLookup for SqliteWorkbaskets {
    fn resolve(&self, locator: &WorkbasketLocator) -> TaskResult<WorkbasketSummary> {
        let conn = self.db.connection()?;
        let found = match locator {
            WorkbasketLocator::Id(id) => conn.query_row(SELECT_BY_ID, params![id], parse_workbasket_row),
            WorkbasketLocator::KeyDomain { key, domain } => conn.query_row(SELECT_BY_KEY, params![key, domain], parse_workbasket_row),
        }
        .optional()?;
        found.ok_or_else(|| TaskError::WorkbasketNotFound(locator.to_string()))
    }
}

fn parse_workbasket_row(row: &Row) -> rusqlite::Result<WorkbasketSummary> {
    Ok(WorkbasketSummary {
        id: row.get(0)?,
        key: row.get(1)?,
        domain: row.get(2)?,
        name: row.get(3)?,
        owner: row.get(4)?,
    })
}
