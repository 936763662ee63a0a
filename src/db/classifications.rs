//! Classification master data.
//!
//! The eight custom fields of a classification are kept together as one JSON
//! array column.

use super::db::Db;
use crate::libs::error::{TaskError, TaskResult};
use crate::libs::store::ClassificationLookup;
use crate::libs::task::ClassificationSummary;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

const SELECT_BY_KEY: &str = "SELECT id, key, domain, category, type, name, parent_id, parent_key, priority, service_level, custom \
     FROM classifications WHERE key = ?1 AND domain = ?2";
pub(super) const UPSERT_CLASSIFICATION: &str = "INSERT INTO classifications \
     (id, key, domain, category, type, name, parent_id, parent_key, priority, service_level, custom) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
     ON CONFLICT(id) DO UPDATE SET key = excluded.key, domain = excluded.domain, category = excluded.category, \
     type = excluded.type, name = excluded.name, parent_id = excluded.parent_id, parent_key = excluded.parent_key, \
     priority = excluded.priority, service_level = excluded.service_level, custom = excluded.custom";

#[derive(Clone)]
pub struct SqliteClassifications {
    db: Db,
}

impl SqliteClassifications {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Inserts the classification or replaces the one with the same id.
    pub fn upsert(&self, classification: &ClassificationSummary) -> TaskResult<()> {
        let custom = serde_json::to_string(&classification.custom)?;
        self.db.connection()?.execute(
            UPSERT_CLASSIFICATION,
            params![
                classification.id,
                classification.key,
                classification.domain,
                classification.category,
                classification.classification_type,
                classification.name,
                classification.parent_id,
                classification.parent_key,
                classification.priority,
                classification.service_level,
                custom,
            ],
        )?;
        Ok(())
    }
}

impl ClassificationLookup for SqliteClassifications {
    fn resolve(&self, key: &str, domain: &str) -> TaskResult<ClassificationSummary> {
        let conn = self.db.connection()?;
        conn.query_row(SELECT_BY_KEY, params![key, domain], parse_classification_row)
            .optional()?
            .ok_or_else(|| TaskError::ClassificationNotFound {
                key: key.to_string(),
                domain: domain.to_string(),
            })
    }
}

fn parse_classification_row(row: &Row) -> rusqlite::Result<ClassificationSummary> {
    let custom: String = row.get(10)?;
    Ok(ClassificationSummary {
        id: row.get(0)?,
        key: row.get(1)?,
        domain: row.get(2)?,
        category: row.get(3)?,
        classification_type: row.get(4)?,
        name: row.get(5)?,
        parent_id: row.get(6)?,
        parent_key: row.get(7)?,
        priority: row.get(8)?,
        service_level: row.get(9)?,
        custom: serde_json::from_str(&custom).map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?,
    })
}
