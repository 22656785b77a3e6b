//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Completed and abandoned meditation sessions
//! - Practice statistics (daily and all-time)
//! - Key-value store for application state (parked timer, streaks)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

use super::data_dir;

/// One recorded session, written when a session ends (completed or
/// cancelled).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub preset_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub completed_stages: u64,
    pub total_stages: u64,
    pub elapsed_sec: u64,
}

impl SessionRecord {
    /// Whether every stage of the session was traversed.
    pub fn is_completed(&self) -> bool {
        self.total_stages > 0 && self.completed_stages == self.total_stages
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_practice_min: u64,
    pub today_sessions: u64,
    pub today_practice_min: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `data_dir()/monkmode.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(data_dir()?.join("monkmode.db"))
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: std::path::PathBuf) -> Result<Self, StorageError> {
        let conn =
            Connection::open(&path).map_err(|source| StorageError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id               TEXT PRIMARY KEY,
                    preset_id        TEXT NOT NULL,
                    started_at       TEXT NOT NULL,
                    ended_at         TEXT,
                    completed_stages INTEGER NOT NULL,
                    total_stages     INTEGER NOT NULL,
                    elapsed_sec      INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    /// Record a session (insert or replace by id).
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions
                 (id, preset_id, started_at, ended_at, completed_stages, total_stages, elapsed_sec)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.preset_id,
                record.started_at.to_rfc3339(),
                record.ended_at.map(|t| t.to_rfc3339()),
                record.completed_stages,
                record.total_stages,
                record.elapsed_sec,
            ],
        )?;
        Ok(())
    }

    /// The most recently started session, if any.
    pub fn last_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, preset_id, started_at, ended_at, completed_stages, total_stages, elapsed_sec
             FROM sessions ORDER BY started_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_record(row)?)),
            None => Ok(None),
        }
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> Result<SessionRecord, StorageError> {
        let started_at: String = row.get(2)?;
        let ended_at: Option<String> = row.get(3)?;
        Ok(SessionRecord {
            id: row.get(0)?,
            preset_id: row.get(1)?,
            started_at: parse_timestamp(&started_at)?,
            ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
            completed_stages: row.get(4)?,
            total_stages: row.get(5)?,
            elapsed_sec: row.get(6)?,
        })
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (sessions, completed, seconds) =
            self.aggregate("WHERE started_at >= ?1", params![format!("{today}T00:00:00+00:00")])?;
        Ok(Stats {
            total_sessions: sessions,
            completed_sessions: completed,
            total_practice_min: seconds / 60,
            today_sessions: sessions,
            today_practice_min: seconds / 60,
        })
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        let (sessions, completed, seconds) = self.aggregate("", [])?;
        let today = self.stats_today()?;
        Ok(Stats {
            total_sessions: sessions,
            completed_sessions: completed,
            total_practice_min: seconds / 60,
            today_sessions: today.today_sessions,
            today_practice_min: today.today_practice_min,
        })
    }

    fn aggregate<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        params: P,
    ) -> Result<(u64, u64, u64), StorageError> {
        let sql = format!(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN completed_stages = total_stages THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(elapsed_sec), 0)
             FROM sessions {where_clause}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let row = stmt.query_row(params, |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        Ok(row)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(completed_stages: u64, total_stages: u64, elapsed_sec: u64) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: Uuid::new_v4().to_string(),
            preset_id: "beginner".into(),
            started_at: now,
            ended_at: Some(now),
            completed_stages,
            total_stages,
            elapsed_sec,
        }
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        db.record_session(&record(3, 3, 840)).unwrap();
        db.record_session(&record(1, 3, 300)).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.total_practice_min, 19);

        let stats = db.stats_today().unwrap();
        assert_eq!(stats.today_sessions, 2);
        assert_eq!(stats.today_practice_min, 19);
    }

    #[test]
    fn last_session_round_trips() {
        let db = Database::open_memory().unwrap();
        assert!(db.last_session().unwrap().is_none());

        let rec = record(3, 3, 840);
        db.record_session(&rec).unwrap();
        let loaded = db.last_session().unwrap().unwrap();
        assert_eq!(loaded.id, rec.id);
        assert_eq!(loaded.elapsed_sec, 840);
        assert!(loaded.is_completed());
    }

    #[test]
    fn replacing_a_record_updates_it() {
        let db = Database::open_memory().unwrap();
        let mut rec = record(0, 3, 0);
        rec.ended_at = None;
        db.record_session(&rec).unwrap();

        rec.completed_stages = 3;
        rec.elapsed_sec = 840;
        rec.ended_at = Some(Utc::now());
        db.record_session(&rec).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.completed_sessions, 1);
    }

    #[test]
    fn reopening_a_database_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monkmode.db");
        {
            let db = Database::open_at(path.clone()).unwrap();
            db.record_session(&record(3, 3, 840)).unwrap();
        }
        let db = Database::open_at(path).unwrap();
        assert_eq!(db.stats_all().unwrap().total_sessions, 1);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}
