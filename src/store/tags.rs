use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::model::Tag;
use crate::store::db::{TodoDb, tag_from_row};

/// Replace every tag link of `task_id` with exactly `tags`. Runs on the
/// caller's connection so it can join an open transaction.
pub(crate) fn replace_task_tags<'a>(
    conn: &Connection,
    task_id: i64,
    tags: impl IntoIterator<Item = &'a Tag>,
) -> Result<()> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
    let mut stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)")?;
    for tag in tags {
        stmt.execute(params![task_id, tag.id])?;
    }
    Ok(())
}

impl TodoDb {
    /// Insert a tag. The storage layer rejects duplicate names; check
    /// [`TodoDb::is_tag_name_exists`] first to avoid the constraint error.
    pub fn add_tag(&self, tag: &Tag) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tags (tag_name, tag_color) VALUES (?1, ?2)",
            params![tag.name, tag.color],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_tag_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT tag_id, tag_name, tag_color FROM tags WHERE tag_id = ?1",
                params![id],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// Exact, case-sensitive name lookup.
    pub fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT tag_id, tag_name, tag_color FROM tags WHERE tag_name = ?1",
                params![name],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// All tags ordered by name.
    pub fn get_all_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag_id, tag_name, tag_color FROM tags ORDER BY tag_name")?;
        let rows = stmt.query_map([], tag_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Returns the number of rows updated.
    pub fn update_tag(&self, tag: &Tag) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE tags SET tag_name = ?1, tag_color = ?2 WHERE tag_id = ?3",
            params![tag.name, tag.color, tag.id],
        )?)
    }

    /// Delete a tag and detach it from every task. Returns the number of tag rows removed.
    pub fn delete_tag(&self, id: i64) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM task_tags WHERE tag_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM tags WHERE tag_id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Case-sensitive exact match on the tag name.
    pub fn is_tag_name_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tags WHERE tag_name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Tags linked to a task, ordered by name. Empty for unknown tasks.
    pub fn get_tags_for_task(&self, task_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.tag_id, t.tag_name, t.tag_color
             FROM tags t
             JOIN task_tags tt ON tt.tag_id = t.tag_id
             WHERE tt.task_id = ?1
             ORDER BY t.tag_name",
        )?;
        let rows = stmt.query_map(params![task_id], tag_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Link a tag to a task. Returns `false` when the link already existed.
    pub fn add_task_tag(&self, task_id: i64, tag_id: i64) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
            params![task_id, tag_id],
        )?;
        Ok(inserted > 0)
    }

    /// Unlink a tag from a task. Returns `false` when there was no link.
    pub fn remove_task_tag(&self, task_id: i64, tag_id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
            params![task_id, tag_id],
        )?;
        Ok(removed > 0)
    }

    /// Replace a task's tag links with exactly `tags`.
    pub fn update_task_tags(&self, task_id: i64, tags: &[Tag]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        replace_task_tags(&tx, task_id, tags)?;
        tx.commit()?;
        Ok(())
    }
}
