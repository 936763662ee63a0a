//! Wiring of ports and policy shared by the task services.
//!
//! A [`TaskEngine`] owns one implementation of every consumed port and hands
//! out short-lived service views ([`TaskService`], [`TaskTransferrer`],
//! [`BulkUpdateCoordinator`], [`TaskMonitor`]) that borrow it. The engine is
//! `Send + Sync`; independent callers may share it across threads.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use basket::db::{db::Db, sqlite_engine};
//! use basket::libs::access::EnvAccessContext;
//! use basket::libs::config::Config;
//! use std::sync::Arc;
//!
//! let db = Db::new()?;
//! let engine = sqlite_engine(&db, &Config::read()?, Arc::new(EnvAccessContext));
//! let task = engine.task_service().get_task("TKI:...")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::access::{AccessContext, CallerIdentity};
use super::auth::{AuthorizationGate, AuthorizationOracle};
use super::bulk::BulkUpdateCoordinator;
use super::config::PolicyConfig;
use super::error::TaskResult;
use super::history::HistoryEventSink;
use super::lifecycle::TaskService;
use super::report::TaskMonitor;
use super::store::{ClassificationLookup, TaskStore, WorkbasketLookup};
use super::transfer::TaskTransferrer;
use super::unit_of_work::UnitOfWork;
use std::sync::Arc;

/// Implementations of every port the engine consumes.
#[derive(Clone)]
pub struct EnginePorts {
    pub access: Arc<dyn AccessContext>,
    pub authorization: Arc<dyn AuthorizationOracle>,
    pub store: Arc<dyn TaskStore>,
    pub workbaskets: Arc<dyn WorkbasketLookup>,
    pub classifications: Arc<dyn ClassificationLookup>,
    pub history: Arc<dyn HistoryEventSink>,
}

pub struct TaskEngine {
    access: Arc<dyn AccessContext>,
    gate: AuthorizationGate,
    store: Arc<dyn TaskStore>,
    workbaskets: Arc<dyn WorkbasketLookup>,
    classifications: Arc<dyn ClassificationLookup>,
    history: Arc<dyn HistoryEventSink>,
    policy: PolicyConfig,
}

impl TaskEngine {
    pub fn new(ports: EnginePorts, policy: PolicyConfig) -> Self {
        Self {
            access: ports.access,
            gate: AuthorizationGate::new(ports.authorization),
            store: ports.store,
            workbaskets: ports.workbaskets,
            classifications: ports.classifications,
            history: ports.history,
            policy,
        }
    }

    pub fn task_service(&self) -> TaskService<'_> {
        TaskService::new(self)
    }

    pub fn transferrer(&self) -> TaskTransferrer<'_> {
        TaskTransferrer::new(self)
    }

    pub fn bulk_updates(&self) -> BulkUpdateCoordinator<'_> {
        BulkUpdateCoordinator::new(self)
    }

    pub fn monitor(&self) -> TaskMonitor<'_> {
        TaskMonitor::new(self)
    }

    pub fn unit_of_work(&self) -> UnitOfWork<'_> {
        UnitOfWork::new(self.store.as_ref(), self.history.as_ref())
    }

    /// Identity of the principal the current call runs for.
    pub fn caller(&self) -> TaskResult<CallerIdentity> {
        self.access.current()
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    pub fn workbaskets(&self) -> &dyn WorkbasketLookup {
        self.workbaskets.as_ref()
    }

    pub fn classifications(&self) -> &dyn ClassificationLookup {
        self.classifications.as_ref()
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }
}
