//! Bulk import of workbaskets, classifications and access-list entries.
//!
//! The engine only reads master data; this is how it gets into the database.
//! The import file is JSON:
//!
//! ```json
//! {
//!   "workbaskets": [{ "id": "WBI:1", "key": "USER-1-1", "domain": "DOMAIN_A", "name": "Basket", "owner": "user-1-1" }],
//!   "classifications": [{ "id": "CLI:1", "key": "L10000", "domain": "DOMAIN_A", "priority": 1, "custom": [null, null, null, null, null, null, null, null] }],
//!   "access": [{ "workbasket_id": "WBI:1", "access_id": "user-1-1", "read": true, "append": true }]
//! }
//! ```

use super::access::{AccessItem, UPSERT_ACCESS_ITEM};
use super::classifications::UPSERT_CLASSIFICATION;
use super::db::Db;
use super::workbaskets::UPSERT_WORKBASKET;
use crate::libs::error::TaskResult;
use crate::libs::task::{ClassificationSummary, WorkbasketSummary};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterData {
    pub workbaskets: Vec<WorkbasketSummary>,
    pub classifications: Vec<ClassificationSummary>,
    pub access: Vec<AccessItem>,
}

impl MasterData {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes everything in one transaction; entries with a known id are replaced.
    pub fn import(&self, db: &Db) -> TaskResult<()> {
        let mut conn = db.connection()?;
        let tx = conn.transaction()?;

        for wb in &self.workbaskets {
            tx.execute(UPSERT_WORKBASKET, params![wb.id, wb.key, wb.domain, wb.name, wb.owner])?;
        }
        for cls in &self.classifications {
            tx.execute(
                UPSERT_CLASSIFICATION,
                params![
                    cls.id,
                    cls.key,
                    cls.domain,
                    cls.category,
                    cls.classification_type,
                    cls.name,
                    cls.parent_id,
                    cls.parent_key,
                    cls.priority,
                    cls.service_level,
                    serde_json::to_string(&cls.custom)?,
                ],
            )?;
        }
        for item in &self.access {
            tx.execute(
                UPSERT_ACCESS_ITEM,
                params![
                    item.workbasket_id,
                    item.access_id.trim().to_lowercase(),
                    item.read,
                    item.open,
                    item.append,
                    item.transfer,
                    item.distribute
                ],
            )?;
        }

        tx.commit()?;
        info!(
            workbaskets = self.workbaskets.len(),
            classifications = self.classifications.len(),
            access_items = self.access.len(),
            "imported master data"
        );
        Ok(())
    }
}
