use std::fs;
use std::path::Path;

use rusqlite::{Connection, Params, Row};
use tracing::warn;

use crate::error::Result;
use crate::model::{Tag, Task};
use crate::store::schema;

pub const DB_FILE: &str = "todo.db";

/// Handle on the local to-do store.
///
/// Callers are assumed to be the only writer; the handle does no internal
/// queuing or threading.
pub struct TodoDb {
    pub(crate) conn: Connection,
}

impl TodoDb {
    /// Open (or create) the store at the given file path and bring its schema
    /// up to date.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA foreign_keys=ON;\
             PRAGMA busy_timeout=5000;",
        )?;
        let db = Self { conn };
        schema::initialize(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self { conn };
        schema::initialize(&db.conn)?;
        Ok(db)
    }

    /// Convenience: open `<data_dir>/todo.db`, creating the directory if needed.
    pub fn from_dir(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Self::open(&data_dir.join(DB_FILE))
    }

    /// Expose the raw connection (for tests or advanced usage).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<i32> {
        schema::user_version(&self.conn)
    }

    /// Run a task query, skipping unreadable rows, and attach each task's tags.
    pub(crate) fn query_tasks<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(task) = task_from_row(row) {
                tasks.push(task);
            }
        }
        drop(rows);
        for task in &mut tasks {
            task.tags = self.get_tags_for_task(task.id)?.into_iter().collect();
        }
        Ok(tasks)
    }
}

/// Map a `SELECT *` row from `tasks`.
///
/// Columns added by later schema versions fall back to their defaults when
/// absent. A row without an id or title is unusable and yields `None`.
pub(crate) fn task_from_row(row: &Row<'_>) -> Option<Task> {
    let id = match row.get::<_, i64>("id") {
        Ok(id) => id,
        Err(err) => {
            warn!(%err, "skipping task row without id");
            return None;
        }
    };
    let title = match row.get::<_, Option<String>>("title") {
        Ok(Some(title)) => title,
        Ok(None) => {
            warn!(task_id = id, "skipping task row with null title");
            return None;
        }
        Err(err) => {
            warn!(task_id = id, %err, "skipping task row without title");
            return None;
        }
    };

    Some(Task {
        id,
        title,
        description: opt_text(row, "description"),
        topic: opt_text(row, "topic"),
        completed: flag(row, "is_completed"),
        created_date: opt_text(row, "created_date").unwrap_or_default(),
        completed_date: opt_text(row, "completed_date"),
        deadline: opt_text(row, "deadline"),
        reminder_enabled: flag(row, "reminder_enabled"),
        reminder_time: opt_text(row, "reminder_time"),
        tags: Default::default(),
    })
}

pub(crate) fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("tag_id")?,
        name: row.get("tag_name")?,
        color: row.get("tag_color")?,
    })
}

fn opt_text(row: &Row<'_>, column: &str) -> Option<String> {
    row.get::<_, Option<String>>(column).ok().flatten()
}

fn flag(row: &Row<'_>, column: &str) -> bool {
    row.get::<_, Option<i64>>(column)
        .ok()
        .flatten()
        .is_some_and(|v| v != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_memory_is_current() {
        let db = TodoDb::open_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
    }

    #[test]
    fn foreign_keys_enabled() {
        let db = TodoDb::open_memory().unwrap();
        let fk: i64 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn from_dir_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        TodoDb::from_dir(&data_dir).unwrap();
        assert!(data_dir.join(DB_FILE).exists());
    }

    #[test]
    fn row_mapping_defaults_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO tasks (title, is_completed, created_date) VALUES ('legacy', 1, NULL)",
            [],
        )
        .unwrap();
        let task = conn
            .query_row("SELECT * FROM tasks", [], |row| Ok(task_from_row(row)))
            .unwrap()
            .unwrap();
        assert_eq!(task.title, "legacy");
        assert!(task.completed);
        assert_eq!(task.created_date, "");
        assert!(!task.reminder_enabled);
        assert_eq!(task.deadline, None);
        assert_eq!(task.completed_date, None);
    }

    #[test]
    fn row_mapping_skips_rows_without_title() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE tasks (id INTEGER PRIMARY KEY, title TEXT);")
            .unwrap();
        conn.execute("INSERT INTO tasks (title) VALUES (NULL)", [])
            .unwrap();
        let mapped = conn
            .query_row("SELECT * FROM tasks", [], |row| Ok(task_from_row(row)))
            .unwrap();
        assert!(mapped.is_none());
    }
}
