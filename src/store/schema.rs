//! Versioned on-disk schema.
//!
//! The schema version lives in SQLite's `user_version` header field. A new
//! file is created directly at [`CURRENT_VERSION`]; an older file is brought
//! forward by running every step of [`MIGRATIONS`] whose target version lies
//! above the stored one, in ascending order, each inside its own transaction.
//! Steps are additive and safe to re-run.

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub const CURRENT_VERSION: i32 = 5;

/// Tags seeded into every store when the tag tables first appear.
pub const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("Work", "#2196F3"),
    ("Personal", "#4CAF50"),
    ("Urgent", "#F44336"),
    ("Study", "#9C27B0"),
    ("Shopping", "#FF9800"),
];

/// One forward schema step.
pub struct Migration {
    /// Version the store is at once this step has run.
    pub version: i32,
    pub description: &'static str,
    pub apply: fn(&Connection) -> Result<()>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        description: "add reminder_enabled and reminder_time to tasks",
        apply: add_reminder_columns,
    },
    Migration {
        version: 3,
        description: "add deadline to tasks",
        apply: add_deadline_column,
    },
    Migration {
        version: 4,
        description: "add completed_date to tasks",
        apply: add_completed_date_column,
    },
    Migration {
        version: 5,
        description: "create tags and task_tags, seed default tags",
        apply: create_tag_tables,
    },
];

const V1_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    topic TEXT,
    is_completed INTEGER DEFAULT 0,
    created_date TEXT
);";

const FRESH_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    topic TEXT,
    is_completed INTEGER DEFAULT 0,
    created_date TEXT,
    deadline TEXT,
    reminder_enabled INTEGER DEFAULT 0,
    reminder_time TEXT,
    completed_date TEXT
);";

const TAG_TABLES: &str = "CREATE TABLE IF NOT EXISTS tags (
    tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_name TEXT UNIQUE NOT NULL,
    tag_color TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS task_tags (
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, tag_id)
);
CREATE INDEX IF NOT EXISTS idx_task_tags_tag ON task_tags(tag_id);";

pub fn user_version(conn: &Connection) -> Result<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn set_user_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name.eq_ignore_ascii_case(column)))
}

fn ensure_column(conn: &Connection, table: &str, column: &str, definition: &str) -> Result<()> {
    if !column_exists(conn, table, column)? {
        conn.execute_batch(&format!(
            "ALTER TABLE {table} ADD COLUMN {column} {definition};"
        ))?;
    }
    Ok(())
}

fn add_reminder_columns(conn: &Connection) -> Result<()> {
    ensure_column(conn, "tasks", "reminder_enabled", "INTEGER DEFAULT 0")?;
    ensure_column(conn, "tasks", "reminder_time", "TEXT")
}

fn add_deadline_column(conn: &Connection) -> Result<()> {
    ensure_column(conn, "tasks", "deadline", "TEXT")
}

fn add_completed_date_column(conn: &Connection) -> Result<()> {
    ensure_column(conn, "tasks", "completed_date", "TEXT")
}

fn create_tag_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(TAG_TABLES)?;
    seed_default_tags(conn)
}

fn seed_default_tags(conn: &Connection) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO tags (tag_name, tag_color) VALUES (?1, ?2)")?;
    for (name, color) in DEFAULT_TAGS {
        stmt.execute([name, color])?;
    }
    Ok(())
}

/// Bring the store to [`CURRENT_VERSION`], creating it if empty.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = user_version(conn)?;
    if version == 0 && !table_exists(conn, "tasks")? {
        return create_fresh(conn);
    }
    // A tasks table without a version stamp predates versioning: treat as v1.
    let from = version.max(1);
    upgrade(conn, from, CURRENT_VERSION)
}

fn create_fresh(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(FRESH_SCHEMA)?;
    create_tag_tables(&tx)?;
    set_user_version(&tx, CURRENT_VERSION)?;
    tx.commit()?;
    info!(version = CURRENT_VERSION, "created new to-do store");
    Ok(())
}

/// Run every migration step with `from < version <= to`, in ascending order.
pub fn upgrade(conn: &Connection, from: i32, to: i32) -> Result<()> {
    let mut steps: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version > from && m.version <= to)
        .collect();
    steps.sort_by_key(|m| m.version);

    for step in steps {
        info!(
            version = step.version,
            description = step.description,
            "applying schema migration"
        );
        let tx = conn.unchecked_transaction()?;
        (step.apply)(&tx)?;
        set_user_version(&tx, step.version)?;
        tx.commit()?;
    }
    Ok(())
}

/// Create the original single-table layout. Only used to exercise upgrades.
pub fn create_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(V1_TASKS)?;
    set_user_version(conn, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
    }

    fn tag_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn migrations_are_strictly_ascending() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.last().copied(), Some(CURRENT_VERSION));
    }

    #[test]
    fn fresh_store_is_current_and_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        assert_eq!(user_version(&conn).unwrap(), CURRENT_VERSION);
        assert_eq!(table_names(&conn), vec!["tags", "task_tags", "tasks"]);
        assert_eq!(tag_count(&conn), DEFAULT_TAGS.len() as i64);
    }

    #[test]
    fn initialize_twice_is_harmless() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
        assert_eq!(tag_count(&conn), 5);
    }

    #[test]
    fn each_step_adds_its_columns() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1(&conn).unwrap();

        upgrade(&conn, 1, 2).unwrap();
        assert!(column_exists(&conn, "tasks", "reminder_enabled").unwrap());
        assert!(column_exists(&conn, "tasks", "reminder_time").unwrap());
        assert!(!column_exists(&conn, "tasks", "deadline").unwrap());
        assert_eq!(user_version(&conn).unwrap(), 2);

        upgrade(&conn, 2, 3).unwrap();
        assert!(column_exists(&conn, "tasks", "deadline").unwrap());

        upgrade(&conn, 3, 4).unwrap();
        assert!(column_exists(&conn, "tasks", "completed_date").unwrap());
        assert!(!table_exists(&conn, "tags").unwrap());

        upgrade(&conn, 4, 5).unwrap();
        assert!(table_exists(&conn, "tags").unwrap());
        assert!(table_exists(&conn, "task_tags").unwrap());
        assert_eq!(user_version(&conn).unwrap(), 5);
    }

    #[test]
    fn rerunning_steps_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1(&conn).unwrap();
        upgrade(&conn, 1, CURRENT_VERSION).unwrap();
        upgrade(&conn, 1, CURRENT_VERSION).unwrap();
        assert_eq!(tag_count(&conn), 5);
        assert_eq!(user_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn unversioned_tasks_table_is_treated_as_v1() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(V1_TASKS).unwrap();
        conn.execute(
            "INSERT INTO tasks (title, is_completed, created_date) VALUES ('old', 0, 'x')",
            [],
        )
        .unwrap();

        initialize(&conn).unwrap();

        assert_eq!(user_version(&conn).unwrap(), CURRENT_VERSION);
        let title: String = conn
            .query_row("SELECT title FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(title, "old");
    }
}
