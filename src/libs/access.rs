//! Caller identity resolution.
//!
//! Every operation starts by asking an [`AccessContext`] who is calling. The
//! answer is a [`CallerIdentity`]: a user id plus the groups the user belongs
//! to. Both are compared case-insensitively, so they are lower-cased on
//! construction.

use super::error::{TaskError, TaskResult};
use std::env;

/// Environment variable holding the CLI caller's user id.
pub const USER_ENV: &str = "BASKET_USER";

/// Environment variable holding the CLI caller's comma separated group ids.
pub const GROUPS_ENV: &str = "BASKET_GROUPS";

/// The principal an operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
    pub groups: Vec<String>,
}

impl CallerIdentity {
    pub fn new(user_id: &str, groups: &[&str]) -> Self {
        Self {
            user_id: user_id.trim().to_lowercase(),
            groups: groups.iter().map(|g| g.trim().to_lowercase()).filter(|g| !g.is_empty()).collect(),
        }
    }

    /// User id followed by group ids.
    pub fn access_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.user_id.as_str()).chain(self.groups.iter().map(String::as_str))
    }
}

/// Resolves the calling principal for the duration of one call.
pub trait AccessContext: Send + Sync {
    fn current(&self) -> TaskResult<CallerIdentity>;
}

/// An access context that always answers with the same identity.
#[derive(Debug, Clone)]
pub struct StaticAccessContext {
    identity: CallerIdentity,
}

impl StaticAccessContext {
    pub fn new(identity: CallerIdentity) -> Self {
        Self { identity }
    }
}

impl AccessContext for StaticAccessContext {
    fn current(&self) -> TaskResult<CallerIdentity> {
        Ok(self.identity.clone())
    }
}

/// Reads the identity from `BASKET_USER` / `BASKET_GROUPS` on every call.
///
/// A `.env` file in the working directory is honored when the binary loads
/// it with `dotenv` before the first call.
#[derive(Debug, Clone, Default)]
pub struct EnvAccessContext;

impl AccessContext for EnvAccessContext {
    fn current(&self) -> TaskResult<CallerIdentity> {
        let user_id = env::var(USER_ENV).ok().filter(|user| !user.trim().is_empty()).ok_or_else(|| TaskError::NotAuthorized {
            user: String::new(),
            reason: format!("no caller identity, set {}", USER_ENV),
        })?;
        let groups = env::var(GROUPS_ENV).unwrap_or_default();
        let groups: Vec<&str> = groups.split(',').collect();

        Ok(CallerIdentity::new(&user_id, &groups))
    }
}
