//! Role and workbasket permission checks.
//!
//! The [`AuthorizationGate`] is called explicitly at the top of every
//! operation, before any persistence side effect. A failed check returns
//! `NotAuthorized` and the operation goes no further.
//!
//! ## Rules
//!
//! - Role checks pass when the caller holds any of the requested roles.
//! - Workbasket permission checks pass for callers in the ADMIN role
//!   without consulting the access list.
//! - Otherwise the [`AuthorizationOracle`] decides per workbasket.

use super::access::CallerIdentity;
use super::error::{TaskError, TaskResult};
use super::task::WorkbasketSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Engine-wide roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    BusinessAdmin,
    Admin,
    Monitor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "USER",
            Role::BusinessAdmin => "BUSINESS_ADMIN",
            Role::Admin => "ADMIN",
            Role::Monitor => "MONITOR",
        };
        f.write_str(name)
    }
}

/// Permissions granted per workbasket in its access list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkbasketPermission {
    Read,
    Open,
    Append,
    Transfer,
    Distribute,
}

impl WorkbasketPermission {
    /// Column of the access list holding this permission.
    pub fn column(&self) -> &'static str {
        match self {
            WorkbasketPermission::Read => "perm_read",
            WorkbasketPermission::Open => "perm_open",
            WorkbasketPermission::Append => "perm_append",
            WorkbasketPermission::Transfer => "perm_transfer",
            WorkbasketPermission::Distribute => "perm_distribute",
        }
    }
}

impl fmt::Display for WorkbasketPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkbasketPermission::Read => "READ",
            WorkbasketPermission::Open => "OPEN",
            WorkbasketPermission::Append => "APPEND",
            WorkbasketPermission::Transfer => "TRANSFER",
            WorkbasketPermission::Distribute => "DISTRIBUTE",
        };
        f.write_str(name)
    }
}

/// Answers role membership and workbasket permission questions.
pub trait AuthorizationOracle: Send + Sync {
    fn has_role(&self, caller: &CallerIdentity, roles: &[Role]) -> bool;

    fn has_permission(&self, caller: &CallerIdentity, workbasket_id: &str, permission: WorkbasketPermission) -> TaskResult<bool>;
}

#[derive(Clone)]
pub struct AuthorizationGate {
    oracle: Arc<dyn AuthorizationOracle>,
}

impl AuthorizationGate {
    pub fn new(oracle: Arc<dyn AuthorizationOracle>) -> Self {
        Self { oracle }
    }

    pub fn is_admin(&self, caller: &CallerIdentity) -> bool {
        self.oracle.has_role(caller, &[Role::Admin])
    }

    /// Requires membership in at least one of `roles`.
    pub fn check_role(&self, caller: &CallerIdentity, roles: &[Role]) -> TaskResult<()> {
        if self.oracle.has_role(caller, roles) {
            return Ok(());
        }
        let names: Vec<String> = roles.iter().map(Role::to_string).collect();
        debug!(user = %caller.user_id, roles = ?names, "role check failed");
        Err(TaskError::NotAuthorized {
            user: caller.user_id.clone(),
            reason: format!("requires one of the roles {}", names.join(", ")),
        })
    }

    /// Requires `permission` on `workbasket`.
    pub fn check_permission(&self, caller: &CallerIdentity, workbasket: &WorkbasketSummary, permission: WorkbasketPermission) -> TaskResult<()> {
        if self.is_admin(caller) {
            return Ok(());
        }
        if self.oracle.has_permission(caller, &workbasket.id, permission)? {
            return Ok(());
        }
        debug!(user = %caller.user_id, workbasket = %workbasket.key, %permission, "permission check failed");
        Err(TaskError::NotAuthorized {
            user: caller.user_id.clone(),
            reason: format!("missing {} permission on workbasket '{}'", permission, workbasket.key),
        })
    }
}
