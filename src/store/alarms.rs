use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, params};
use tracing::warn;

use crate::dates;
use crate::error::Result;
use crate::reminder::alarm::{AlarmError, AlarmService, ArmedTrigger, TriggerId, TriggerPayload};

pub const ALARMS_FILE: &str = "alarms.db";

/// Persistent trigger registry for hosts without a platform alarm manager.
///
/// `todolist remind fire-due` drains it; a cron entry or systemd timer
/// stands in for the wake-up.
pub struct SqliteAlarms {
    conn: Connection,
}

impl SqliteAlarms {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA busy_timeout=5000;",
        )?;
        let alarms = Self { conn };
        alarms.create_tables()?;
        Ok(alarms)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let alarms = Self { conn };
        alarms.create_tables()?;
        Ok(alarms)
    }

    /// Open `<data_dir>/alarms.db`, creating the directory if needed.
    pub fn from_dir(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Self::open(&data_dir.join(ALARMS_FILE))
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS alarms (
                trigger_id INTEGER PRIMARY KEY,
                task_id INTEGER NOT NULL,
                fire_at TEXT NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_alarms_fire_at ON alarms(fire_at);
            CREATE INDEX IF NOT EXISTS idx_alarms_task ON alarms(task_id);",
        )?;
        Ok(())
    }

    /// Every armed trigger, earliest first.
    pub fn list(&self) -> Result<Vec<ArmedTrigger>> {
        self.select("SELECT * FROM alarms ORDER BY fire_at ASC, trigger_id ASC", [])
    }

    pub fn list_for_task(&self, task_id: i64) -> Result<Vec<ArmedTrigger>> {
        self.select(
            "SELECT * FROM alarms WHERE task_id = ?1 ORDER BY fire_at ASC, trigger_id ASC",
            params![task_id],
        )
    }

    /// Triggers due at or before `now`, earliest first. They stay armed until
    /// removed.
    pub fn due(&self, now: NaiveDateTime) -> Result<Vec<ArmedTrigger>> {
        self.select(
            "SELECT * FROM alarms WHERE fire_at <= ?1 ORDER BY fire_at ASC, trigger_id ASC",
            params![dates::format_timestamp(now)],
        )
    }

    pub fn remove(&self, id: TriggerId) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM alarms WHERE trigger_id = ?1", params![id])?;
        Ok(n > 0)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM alarms", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ArmedTrigger>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(trigger) = trigger_from_row(row)? {
                out.push(trigger);
            }
        }
        Ok(out)
    }
}

fn trigger_from_row(row: &Row<'_>) -> rusqlite::Result<Option<ArmedTrigger>> {
    let id: TriggerId = row.get("trigger_id")?;
    let raw_fire_at: String = row.get("fire_at")?;
    let raw_kind: String = row.get("kind")?;
    let Some(fire_at) = dates::parse_timestamp(&raw_fire_at) else {
        warn!(trigger_id = id, fire_at = %raw_fire_at, "skipping alarm with unreadable time");
        return Ok(None);
    };
    let Ok(kind) = raw_kind.parse() else {
        warn!(trigger_id = id, kind = %raw_kind, "skipping alarm with unknown kind");
        return Ok(None);
    };
    Ok(Some(ArmedTrigger {
        id,
        fire_at,
        payload: TriggerPayload {
            task_id: row.get("task_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            kind,
        },
    }))
}

impl AlarmService for SqliteAlarms {
    fn schedule(
        &self,
        id: TriggerId,
        fire_at: NaiveDateTime,
        payload: &TriggerPayload,
    ) -> std::result::Result<(), AlarmError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO alarms (trigger_id, task_id, fire_at, kind, title, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                payload.task_id,
                dates::format_timestamp(fire_at),
                payload.kind.to_string(),
                payload.title,
                payload.description,
            ],
        )?;
        Ok(())
    }

    fn cancel(&self, id: TriggerId) -> std::result::Result<(), AlarmError> {
        self.conn
            .execute("DELETE FROM alarms WHERE trigger_id = ?1", params![id])?;
        Ok(())
    }
}
