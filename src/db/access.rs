//! Workbasket access list and the authorization oracle built on it.
//!
//! A caller holds a permission on a workbasket when any of its access ids
//! (user id or one of its groups) has an access-list entry for that
//! workbasket with the permission flag set. Role membership comes from the
//! `roles` section of the configuration.

use super::db::Db;
use crate::libs::access::CallerIdentity;
use crate::libs::auth::{AuthorizationOracle, Role, WorkbasketPermission};
use crate::libs::config::RolesConfig;
use crate::libs::error::TaskResult;
use rusqlite::{params, params_from_iter};
use serde::{Deserialize, Serialize};

pub(super) const UPSERT_ACCESS_ITEM: &str = "INSERT INTO workbasket_access_list \
     (workbasket_id, access_id, perm_read, perm_open, perm_append, perm_transfer, perm_distribute) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
     ON CONFLICT(workbasket_id, access_id) DO UPDATE SET perm_read = excluded.perm_read, perm_open = excluded.perm_open, \
     perm_append = excluded.perm_append, perm_transfer = excluded.perm_transfer, perm_distribute = excluded.perm_distribute";

/// One access-list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessItem {
    pub workbasket_id: String,
    pub access_id: String,
    pub read: bool,
    pub open: bool,
    pub append: bool,
    pub transfer: bool,
    pub distribute: bool,
}

impl AccessItem {
    pub fn new(workbasket_id: &str, access_id: &str, permissions: &[WorkbasketPermission]) -> Self {
        let has = |p: WorkbasketPermission| permissions.contains(&p);
        Self {
            workbasket_id: workbasket_id.to_string(),
            access_id: access_id.to_string(),
            read: has(WorkbasketPermission::Read),
            open: has(WorkbasketPermission::Open),
            append: has(WorkbasketPermission::Append),
            transfer: has(WorkbasketPermission::Transfer),
            distribute: has(WorkbasketPermission::Distribute),
        }
    }
}

#[derive(Clone)]
pub struct AccessList {
    db: Db,
    roles: RolesConfig,
}

impl AccessList {
    pub fn new(db: Db, roles: RolesConfig) -> Self {
        Self { db, roles }
    }

    /// Grants exactly the flags of `item`, replacing an earlier entry for the same pair.
    pub fn grant(&self, item: &AccessItem) -> TaskResult<()> {
        self.db.connection()?.execute(
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
        Ok(())
    }
}

impl AuthorizationOracle for AccessList {
    fn has_role(&self, caller: &CallerIdentity, roles: &[Role]) -> bool {
        self.roles.grants(caller, roles)
    }

    fn has_permission(&self, caller: &CallerIdentity, workbasket_id: &str, permission: WorkbasketPermission) -> TaskResult<bool> {
        let access_ids: Vec<&str> = caller.access_ids().collect();
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM workbasket_access_list WHERE workbasket_id = ? AND {} = 1 AND access_id IN ({}))",
            permission.column(),
            vec!["?"; access_ids.len()].join(", ")
        );
        let values = std::iter::once(workbasket_id).chain(access_ids);
        let conn = self.db.connection()?;
        Ok(conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?)
    }
}
