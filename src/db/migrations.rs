//! Database schema migration management and versioning system.
//!
//! Each migration runs in its own transaction and is recorded in the
//! `migrations` table, so a database is always at a well-defined version and
//! re-running the manager is a no-op.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use basket::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open("basket.db")?;
//! init_with_migrations(&mut conn)?;
//! let version = get_db_version(&conn)?;
//! # Ok::<(), rusqlite::Error>(())
//! ```

use crate::libs::messages::Message;
use rusqlite::{params, Connection, Result, Transaction};
use tracing::{debug, error, info};

/// SQL schema for the migrations tracking table.
const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

/// Ordered registry of every schema change.
pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: task rows with denormalized workbasket, classification and object reference
        self.add_migration(1, "create_tasks", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id TEXT NOT NULL PRIMARY KEY,
                    name TEXT,
                    description TEXT,
                    priority INTEGER NOT NULL DEFAULT 0,
                    state TEXT NOT NULL,
                    is_read INTEGER NOT NULL DEFAULT 0,
                    is_transferred INTEGER NOT NULL DEFAULT 0,
                    created TEXT NOT NULL,
                    modified TEXT NOT NULL,
                    planned TEXT NOT NULL,
                    claimed TEXT,
                    completed TEXT,
                    classification_key TEXT NOT NULL,
                    classification TEXT NOT NULL,
                    workbasket_id TEXT NOT NULL,
                    workbasket_key TEXT NOT NULL,
                    workbasket_name TEXT,
                    workbasket_owner TEXT,
                    domain TEXT NOT NULL,
                    owner TEXT,
                    por_company TEXT NOT NULL,
                    por_system TEXT NOT NULL,
                    por_system_instance TEXT NOT NULL,
                    por_type TEXT NOT NULL,
                    por_value TEXT NOT NULL,
                    custom_attributes TEXT NOT NULL DEFAULT '{}',
                    callback_info TEXT NOT NULL DEFAULT '{}',
                    business_process_id TEXT,
                    parent_business_process_id TEXT
                )",
                [],
            )?;
            tx.execute(
                "CREATE INDEX IF NOT EXISTS idx_tasks_por ON tasks(por_value, por_type, por_company, por_system, por_system_instance)",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_domain_state ON tasks(domain, state)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_workbasket ON tasks(workbasket_id)", [])?;
            Ok(())
        });

        // Version 2: master data read by the lookups and the access list
        self.add_migration(2, "create_master_data", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS workbaskets (
                    id TEXT NOT NULL PRIMARY KEY,
                    key TEXT NOT NULL,
                    domain TEXT NOT NULL,
                    name TEXT,
                    owner TEXT,
                    UNIQUE (key, domain)
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS classifications (
                    id TEXT NOT NULL PRIMARY KEY,
                    key TEXT NOT NULL,
                    domain TEXT NOT NULL,
                    category TEXT,
                    type TEXT,
                    name TEXT,
                    parent_id TEXT,
                    parent_key TEXT,
                    priority INTEGER NOT NULL DEFAULT 0,
                    service_level TEXT,
                    custom TEXT NOT NULL DEFAULT '[]',
                    UNIQUE (key, domain)
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS workbasket_access_list (
                    id INTEGER PRIMARY KEY,
                    workbasket_id TEXT NOT NULL,
                    access_id TEXT NOT NULL,
                    perm_read INTEGER NOT NULL DEFAULT 0,
                    perm_open INTEGER NOT NULL DEFAULT 0,
                    perm_append INTEGER NOT NULL DEFAULT 0,
                    perm_transfer INTEGER NOT NULL DEFAULT 0,
                    perm_distribute INTEGER NOT NULL DEFAULT 0,
                    UNIQUE (workbasket_id, access_id),
                    FOREIGN KEY (workbasket_id) REFERENCES workbaskets(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_access_list_access_id ON workbasket_access_list(access_id)", [])?;
            Ok(())
        });

        // Version 3: history events written after committed mutations
        self.add_migration(3, "create_history_events", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS history_events (
                    id INTEGER PRIMARY KEY,
                    kind TEXT NOT NULL,
                    task_id TEXT NOT NULL,
                    actor TEXT NOT NULL,
                    created TEXT NOT NULL
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_history_events_task ON history_events(task_id)", [])?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every migration newer than the recorded version.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;
        let current_version = self.get_current_version(conn)?;

        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();
        if pending.is_empty() {
            debug!("{}", Message::DatabaseUpToDate(current_version));
            return Ok(());
        }

        for migration in pending {
            let tx = conn.transaction()?;
            if let Err(e) = (migration.up)(&tx) {
                error!(error = %e, "{}", Message::MigrationFailed(migration.version, migration.name.to_string()));
                return Err(e);
            }
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
            tx.commit()?;
            info!("{}", Message::MigrationApplied(migration.version, migration.name.to_string()));
        }

        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    /// `(version, name, applied_at)` of every applied migration.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;
        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    Ok(manager.get_current_version(conn)? < manager.latest_version())
}
