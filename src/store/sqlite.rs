//! SQLite backend.
//!
//! Two tables:
//! - archive: id, tables (json), saved_at
//! - current: a single row holding the live arrangement
//!
//! Rotation inserts into archive and replaces current inside one
//! immediate transaction. Writers in other processes are excluded with a
//! `<db>.lock` file next to the database.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{Backend, WriterLock};
use crate::error::StoreError;
use crate::pairing::Arrangement;
use crate::timestamp::GenerationId;

const CURRENT: &str = "current";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS archive (
            id TEXT PRIMARY KEY NOT NULL,
            tables TEXT NOT NULL,
            saved_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS current (
            slot INTEGER PRIMARY KEY CHECK (slot = 0),
            tables TEXT NOT NULL,
            saved_at INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Database handle shared by all store operations.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    lock_path: Option<PathBuf>,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let id = path.display().to_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("open", parent.display().to_string(), e))?;
        }
        let conn = Connection::open(path).map_err(StoreError::sqlite("open", id.as_str()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(StoreError::sqlite("open", id.as_str()))?;

        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");
        Self::from_connection(conn, Some(PathBuf::from(lock_path)), &id)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::sqlite("open", ":memory:"))?;
        Self::from_connection(conn, None, ":memory:")
    }

    fn from_connection(conn: Connection, lock_path: Option<PathBuf>, id: &str) -> Result<Self, StoreError> {
        init_schema(&conn).map_err(StoreError::sqlite("init schema", id))?;
        tracing::debug!(db = id, "opened sqlite snapshot store");
        Ok(SqliteBackend {
            conn: Mutex::new(conn),
            lock_path,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn encode(arrangement: &Arrangement, op: &'static str, id: &str) -> Result<String, StoreError> {
    serde_json::to_string(arrangement).map_err(|e| StoreError::json(op, id, e))
}

fn decode(raw: Option<String>, op: &'static str, id: &str) -> Result<Option<Arrangement>, StoreError> {
    raw.map(|json| serde_json::from_str(&json).map_err(|e| StoreError::json(op, id, e)))
        .transpose()
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn insert_archive(conn: &Connection, id: &GenerationId, tables: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO archive (id, tables, saved_at) VALUES (?1, ?2, ?3)",
        params![id.as_str(), tables, now_secs()],
    )
    .map_err(StoreError::sqlite("archive", id.as_str()))?;
    tracing::debug!(id = %id, "inserted archive row");
    Ok(())
}

fn replace_current(conn: &Connection, tables: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO current (slot, tables, saved_at) VALUES (0, ?1, ?2)",
        params![tables, now_secs()],
    )
    .map_err(StoreError::sqlite("write current", CURRENT))?;
    tracing::debug!("replaced current row");
    Ok(())
}

impl Backend for SqliteBackend {
    fn put(&self, id: &GenerationId, arrangement: &Arrangement) -> Result<(), StoreError> {
        let tables = encode(arrangement, "archive", id.as_str())?;
        let conn = self.conn()?;
        insert_archive(&conn, id, &tables)
    }

    fn get(&self, id: &GenerationId) -> Result<Option<Arrangement>, StoreError> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT tables FROM archive WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::sqlite("read archive", id.as_str()))?;
        tracing::debug!(id = %id, found = raw.is_some(), "read archive row");
        decode(raw, "read archive", id.as_str())
    }

    fn keys(&self) -> Result<Vec<GenerationId>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id FROM archive")
            .map_err(StoreError::sqlite("list archive", "archive"))?;

        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StoreError::sqlite("list archive", "archive"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite("list archive", "archive"))?;

        tracing::debug!(count = raw.len(), "listed archive rows");
        Ok(raw.iter().filter_map(|id| GenerationId::parse(id)).collect())
    }

    fn current(&self) -> Result<Option<Arrangement>, StoreError> {
        let raw: Option<String> = self
            .conn()?
            .query_row("SELECT tables FROM current WHERE slot = 0", [], |row| row.get(0))
            .optional()
            .map_err(StoreError::sqlite("read current", CURRENT))?;
        tracing::debug!(found = raw.is_some(), "read current row");
        decode(raw, "read current", CURRENT)
    }

    fn set_current(&self, arrangement: &Arrangement) -> Result<(), StoreError> {
        let tables = encode(arrangement, "write current", CURRENT)?;
        let conn = self.conn()?;
        replace_current(&conn, &tables)
    }

    fn lock_writers(&self) -> Result<WriterLock, StoreError> {
        match &self.lock_path {
            Some(path) => WriterLock::acquire(path),
            None => Ok(WriterLock::in_process()),
        }
    }

    fn rotate(
        &self,
        archive: Option<(&GenerationId, &Arrangement)>,
        next: &Arrangement,
    ) -> Result<(), StoreError> {
        let next_tables = encode(next, "write current", CURRENT)?;
        let archived = archive
            .map(|(id, old)| encode(old, "archive", id.as_str()).map(|tables| (id, tables)))
            .transpose()?;

        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::sqlite("begin rotation", CURRENT))?;

        if let Some((id, tables)) = &archived {
            insert_archive(&tx, id, tables)?;
        }
        replace_current(&tx, &next_tables)?;

        tx.commit().map_err(StoreError::sqlite("commit rotation", CURRENT))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::Table;
    use crate::roster::Category;

    fn sample(tag: &str) -> Arrangement {
        Arrangement::new(vec![Table::pair(format!("{tag}-a"), format!("{tag}-b"), Category::Male)])
    }

    #[test]
    fn rotation_archives_and_replaces() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set_current(&sample("old")).unwrap();

        let id = GenerationId::parse("19-01-2026_21-15-31").unwrap();
        backend.rotate(Some((&id, &sample("old"))), &sample("new")).unwrap();

        assert_eq!(backend.current().unwrap(), Some(sample("new")));
        assert_eq!(backend.get(&id).unwrap(), Some(sample("old")));
        assert_eq!(backend.keys().unwrap(), vec![id]);
    }

    #[test]
    fn failed_rotation_rolls_back() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let id = GenerationId::parse("dup").unwrap();
        backend.put(&id, &sample("first")).unwrap();
        backend.set_current(&sample("live")).unwrap();

        let err = backend.rotate(Some((&id, &sample("live"))), &sample("next"));
        assert!(matches!(err, Err(StoreError::Sqlite { .. })));
        assert_eq!(backend.current().unwrap(), Some(sample("live")));
        assert_eq!(backend.get(&id).unwrap(), Some(sample("first")));
    }

    #[test]
    fn missing_rows_are_none() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert_eq!(backend.current().unwrap(), None);
        assert_eq!(backend.get(&GenerationId::parse("nope").unwrap()).unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn file_database_locks_beside_itself() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::open(dir.path().join("seatmate.db")).unwrap();
        let lock = backend.lock_writers().unwrap();
        assert!(dir.path().join("seatmate.db.lock").exists());
        drop(lock);

        let in_memory = SqliteBackend::open_in_memory().unwrap();
        in_memory.lock_writers().unwrap();
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("seatmate.db");
        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.set_current(&sample("kept")).unwrap();
        }
        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.current().unwrap(), Some(sample("kept")));
    }
}
