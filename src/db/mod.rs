//! SQLite persistence for the basket engine.
//!
//! Implements every port the task core consumes on top of one database file:
//! the task store, the workbasket and classification lookups, the access list
//! and the history sink. [`sqlite_engine`] wires them into a [`TaskEngine`].
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
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection pool and database handle.
pub mod db;

/// Versioned schema changes.
pub mod migrations;

pub mod access;
pub mod classifications;
pub mod history;
pub mod master_data;

/// Transactional task rows.
pub mod tasks;

pub mod workbaskets;

use crate::libs::access::AccessContext;
use crate::libs::config::{Config, HistorySinkKind};
use crate::libs::engine::{EnginePorts, TaskEngine};
use crate::libs::history::{HistoryEventSink, NoHistory, TracingHistory};
use access::AccessList;
use classifications::SqliteClassifications;
use db::Db;
use history::SqliteHistory;
use std::sync::Arc;
use tasks::SqliteTaskStore;
use workbaskets::SqliteWorkbaskets;

/// Builds an engine whose ports all live in `db`.
pub fn sqlite_engine(db: &Db, config: &Config, access: Arc<dyn AccessContext>) -> TaskEngine {
    let history: Arc<dyn HistoryEventSink> = match (config.history.enabled, config.history.sink) {
        (false, _) => Arc::new(NoHistory),
        (true, HistorySinkKind::Database) => Arc::new(SqliteHistory::new(db.clone())),
        (true, HistorySinkKind::Log) => Arc::new(TracingHistory),
    };

    let ports = EnginePorts {
        access,
        authorization: Arc::new(AccessList::new(db.clone(), config.roles.clone())),
        store: Arc::new(SqliteTaskStore::new(db.clone())),
        workbaskets: Arc::new(SqliteWorkbaskets::new(db.clone())),
        classifications: Arc::new(SqliteClassifications::new(db.clone())),
        history,
    };
    TaskEngine::new(ports, config.policy.clone())
}
