//! SQLite connection management.
//!
//! A [`Db`] is a cheap, cloneable handle on a small connection pool for one
//! database file. Connections are handed out as [`PooledConnection`] guards
//! and go back to the pool when the guard drops; a connection that still has
//! a transaction open at that point is closed instead of reused.
//!
//! Every connection runs in WAL mode with a busy timeout, so readers proceed
//! while one writer holds the write lock and concurrent writers wait for
//! each other instead of failing immediately.

use super::migrations::init_with_migrations;
use crate::libs::data_storage::DataStorage;
use crate::libs::error::TaskResult;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "basket.db";

/// How long a connection waits for a competing writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle connections kept around for reuse.
const MAX_IDLE_CONNECTIONS: usize = 8;

struct ConnectionPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        if !conn.is_autocommit() {
            return;
        }
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_CONNECTIONS {
            idle.push(conn);
        }
    }
}

/// A connection borrowed from the pool.
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("pooled connection used after release")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection used after release")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[derive(Clone)]
pub struct Db {
    pool: Arc<ConnectionPool>,
}

impl Db {
    /// Opens the application database in the platform data directory.
    pub fn new() -> anyhow::Result<Db> {
        let db_file_path = DataStorage::new().get_path(DB_FILE_NAME)?;
        Ok(Db::open(db_file_path)?)
    }

    /// Opens (creating if needed) the database at `path` and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> TaskResult<Db> {
        let db = Db {
            pool: Arc::new(ConnectionPool {
                path: path.as_ref().to_path_buf(),
                idle: Mutex::new(Vec::new()),
            }),
        };
        {
            let mut conn = db.connection()?;
            init_with_migrations(&mut conn)?;
        }
        Ok(db)
    }

    /// Borrows a connection, opening a new one when none is idle.
    pub fn connection(&self) -> TaskResult<PooledConnection<'_>> {
        let reused = self.pool.idle.lock().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.pool.connect()?,
        };
        Ok(PooledConnection {
            pool: &self.pool,
            conn: Some(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.pool.path
    }
}
