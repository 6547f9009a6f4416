//! SQLite-backed source stores
//!
//! The cluster database (seat sessions and workstation health) and the exam
//! database are owned by other systems. The service opens them read-only;
//! `in_memory` creates the expected schema so the queries can be tested.

use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{StoreError, StoreResult};

/// Exam session states that count as an occupied seat
pub const ACTIVE_EXAM_STATES: [&str; 2] = ["wait_choice", "in_progress"];

/// An ordinary session with no end time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRow {
    pub login: String,
    pub hostname: Option<String>,
}

/// A workstation from the health registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkstationRow {
    pub hostname: Option<String>,
    pub alive: bool,
}

/// An exam session awaiting start or in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSessionRow {
    pub username: String,
    pub last_known_ip: Option<String>,
    pub last_known_hostname: Option<String>,
}

fn open_read_only(path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    debug!(path = %path.display(), "Opened source database read-only");
    Ok(conn)
}

fn lock(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StoreError::LockPoisoned)
}

fn ping(conn: &Mutex<Connection>) -> bool {
    match conn.lock() {
        Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
        Err(_) => {
            warn!("Source database lock poisoned");
            false
        }
    }
}

/// Seat/session directory and host health registry
pub struct ClusterDb {
    conn: Mutex<Connection>,
}

impl ClusterDb {
    /// Open an existing database read-only
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_read_only(path.as_ref())?),
        })
    }

    /// Create an in-memory database with the expected schema (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            r#"
            -- Seat sessions; open sessions have no end time
            CREATE TABLE IF NOT EXISTS location (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                login TEXT NOT NULL,
                hostname TEXT,
                begin_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                end_at TEXT
            );

            -- Workstation inventory and liveness
            CREATE TABLE IF NOT EXISTS workstation (
                hostname TEXT PRIMARY KEY,
                alive INTEGER NOT NULL DEFAULT 1,
                active INTEGER NOT NULL DEFAULT 1
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Sessions with no recorded end time
    pub fn active_seats(&self) -> StoreResult<Vec<SeatRow>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT login, hostname FROM location WHERE end_at IS NULL ORDER BY rowid")?;

        let rows = stmt.query_map([], |row| {
            Ok(SeatRow {
                login: row.get(0)?,
                hostname: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Workstations that are in service but not alive
    pub fn dead_workstations(&self) -> StoreResult<Vec<WorkstationRow>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT hostname, alive FROM workstation WHERE alive = 0 AND active = 1 ORDER BY hostname",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(WorkstationRow {
                hostname: row.get(0)?,
                alive: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn is_healthy(&self) -> bool {
        ping(&self.conn)
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> StoreResult<()> {
        lock(&self.conn)?.execute_batch(sql)?;
        Ok(())
    }
}

/// Exam session directory
pub struct ExamDb {
    conn: Mutex<Connection>,
}

impl ExamDb {
    /// Open an existing database read-only
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_read_only(path.as_ref())?),
        })
    }

    /// Create an in-memory database with the expected schema (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS "user" (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS exam_session (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES "user"(id),
                state TEXT NOT NULL,
                last_known_ip TEXT,
                last_known_hostname TEXT
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Sessions awaiting start or in progress
    pub fn active_sessions(&self) -> StoreResult<Vec<ExamSessionRow>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.username, s.last_known_ip, s.last_known_hostname
            FROM exam_session s
            JOIN "user" u ON u.id = s.user_id
            WHERE s.state IN (?1, ?2)
            ORDER BY s.rowid
            "#,
        )?;

        let rows = stmt.query_map(params![ACTIVE_EXAM_STATES[0], ACTIVE_EXAM_STATES[1]], |row| {
            Ok(ExamSessionRow {
                username: row.get(0)?,
                last_known_ip: row.get(1)?,
                last_known_hostname: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn is_healthy(&self) -> bool {
        ping(&self.conn)
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> StoreResult<()> {
        lock(&self.conn)?.execute_batch(sql)?;
        Ok(())
    }
}
