use chrono::NaiveDateTime;
use rusqlite::params;
use tracing::{debug, warn};

use crate::dates;
use crate::error::Result;
use crate::model::Task;
use crate::store::db::TodoDb;
use crate::store::tags::replace_task_tags;

impl TodoDb {
    /// Insert a task and its tag links. Returns the generated id.
    ///
    /// `task.id` is ignored; `created_date` is written as given.
    pub fn add_task(&self, task: &Task) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (title, description, topic, is_completed, created_date, deadline, reminder_enabled, reminder_time, completed_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.title,
                task.description,
                task.topic,
                task.completed as i64,
                task.created_date,
                task.deadline,
                task.reminder_enabled as i64,
                task.reminder_time,
                task.completed_date,
            ],
        )?;
        let id = tx.last_insert_rowid();
        if !task.tags.is_empty() {
            replace_task_tags(&tx, id, &task.tags)?;
        }
        tx.commit()?;
        debug!(task_id = id, "task added");
        Ok(id)
    }

    /// All tasks, most recently created first.
    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.query_tasks("SELECT * FROM tasks ORDER BY id DESC", [])
    }

    /// One page of [`TodoDb::get_all_tasks`].
    pub fn get_all_tasks_page(&self, limit: u32, offset: u32) -> Result<Vec<Task>> {
        self.query_tasks(
            "SELECT * FROM tasks ORDER BY id DESC LIMIT ?1 OFFSET ?2",
            params![limit, offset],
        )
    }

    pub fn get_tasks_by_topic(&self, topic: &str) -> Result<Vec<Task>> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE topic = ?1 ORDER BY id DESC",
            params![topic],
        )
    }

    pub fn get_tasks_by_topic_page(&self, topic: &str, limit: u32, offset: u32) -> Result<Vec<Task>> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE topic = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            params![topic, limit, offset],
        )
    }

    pub fn get_task_by_id(&self, id: i64) -> Result<Option<Task>> {
        let mut tasks = self.query_tasks("SELECT * FROM tasks WHERE id = ?1", params![id])?;
        Ok(tasks.pop())
    }

    /// Overwrite every mutable column of the task with the given id and replace
    /// its tag links with exactly `task.tags`.
    ///
    /// Returns the number of task rows updated; `0` means no such task and
    /// nothing was written.
    pub fn update_task(&self, task: &Task) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, topic = ?3, is_completed = ?4,
                deadline = ?5, reminder_enabled = ?6, reminder_time = ?7, completed_date = ?8
             WHERE id = ?9",
            params![
                task.title,
                task.description,
                task.topic,
                task.completed as i64,
                task.deadline,
                task.reminder_enabled as i64,
                task.reminder_time,
                task.completed_date,
                task.id,
            ],
        )?;
        if changed == 0 {
            debug!(task_id = task.id, "update matched no task");
            return Ok(0);
        }
        replace_task_tags(&tx, task.id, &task.tags)?;
        tx.commit()?;
        Ok(changed)
    }

    /// Remove a task and its tag links. Returns the number of task rows removed.
    pub fn delete_task(&self, id: i64) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Distinct non-null topics, alphabetically.
    pub fn get_all_topics(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT topic FROM tasks WHERE topic IS NOT NULL ORDER BY topic")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn get_total_task_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM tasks", [])
    }

    pub fn get_task_count_by_topic(&self, topic: &str) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM tasks WHERE topic = ?1", params![topic])
    }

    pub fn get_completed_tasks_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM tasks WHERE is_completed = 1", [])
    }

    pub fn get_pending_tasks_count(&self) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM tasks WHERE is_completed = 0 OR is_completed IS NULL",
            [],
        )
    }

    pub fn get_completed_tasks(&self) -> Result<Vec<Task>> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE is_completed = 1 ORDER BY id DESC",
            [],
        )
    }

    /// Completed tasks whose completion timestamp lies in `[start, end]`.
    ///
    /// Stored timestamps are free text, so the range check happens after
    /// parsing; rows with an unreadable completion date are skipped.
    pub fn get_tasks_completed_in_period(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Task>> {
        let completed = self.get_completed_tasks()?;
        Ok(completed
            .into_iter()
            .filter(|task| {
                let Some(raw) = task.completed_date.as_deref() else {
                    return false;
                };
                match dates::parse_timestamp(raw) {
                    Some(at) => at >= start && at <= end,
                    None => {
                        warn!(task_id = task.id, completed_date = raw, "unparsable completion date");
                        false
                    }
                }
            })
            .collect())
    }

    /// Tasks that carry a non-empty deadline, earliest deadline first.
    pub fn get_tasks_with_deadlines(&self) -> Result<Vec<Task>> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE deadline IS NOT NULL AND deadline != ''
             ORDER BY deadline ASC, id DESC",
            [],
        )
    }

    fn count<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<u64> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
