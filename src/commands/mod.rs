pub mod agenda;
pub mod create;
pub mod delete;
pub mod edit;
pub mod init;
pub mod lifecycle;
pub mod list;
pub mod pin;
pub mod remind;
pub mod show;
pub mod stats;
pub mod tag;

use std::collections::BTreeSet;
use std::path::Path;

use colored::Colorize;
use tracing::warn;

use crate::dates;
use crate::error::{Result, TodoError};
use crate::model::Tag;
use crate::reminder::ArmReport;
use crate::store::lock::WriterLock;
use crate::store::repo::Repo;
use crate::tags::TagManager;

/// Take the single-writer lock, then open the store. Migrations on open run
/// under the lock.
pub(crate) fn open_for_write(data_dir: &Path) -> Result<(Repo, WriterLock)> {
    Repo::ensure_initialized(data_dir)?;
    let lock = WriterLock::acquire(data_dir)?;
    let repo = Repo::open(data_dir)?;
    Ok((repo, lock))
}

pub(crate) fn valid_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TodoError::InvalidTitle);
    }
    Ok(title.to_string())
}

/// Trimmed deadline text, rejected unless its date part parses.
pub(crate) fn valid_deadline(raw: &str) -> Result<String> {
    let deadline = raw.trim();
    if dates::parse_deadline(deadline).is_none() {
        return Err(TodoError::InvalidDate(raw.to_string()));
    }
    Ok(deadline.to_string())
}

/// Empty input clears an optional text field.
pub(crate) fn optional_text(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Look up or create each named tag.
pub(crate) fn resolve_tags(tags: &TagManager<'_>, names: &[String]) -> Result<BTreeSet<Tag>> {
    let mut resolved = BTreeSet::new();
    for name in names.iter().filter(|n| !n.trim().is_empty()) {
        let tag = match tags.resolve(name)? {
            Some(tag) => tag,
            None => tags.get_or_create_tag(name)?,
        };
        if !resolved.iter().any(|t: &Tag| t.id == tag.id) {
            resolved.insert(tag);
        }
    }
    Ok(resolved)
}

pub(crate) fn report_arming(report: &ArmReport, pretty: bool) {
    if !report.failed.is_empty() {
        warn!(
            task_id = report.task_id,
            failed = report.failed.len(),
            "some reminders could not be armed"
        );
    }
    if pretty && !report.armed.is_empty() {
        println!(
            "  {} {} armed",
            "reminders:".dimmed(),
            report.armed.len().to_string().bold()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::alarms::ALARMS_FILE;
    use crate::store::lock::LOCK_FILE;
    use tempfile::tempdir;

    #[test]
    fn held_lock_blocks_before_store_is_opened() {
        let dir = tempdir().unwrap();
        drop(Repo::init(dir.path()).unwrap());
        std::fs::remove_file(dir.path().join(ALARMS_FILE)).unwrap();

        let _held = WriterLock::acquire(dir.path()).unwrap();
        let err = open_for_write(dir.path()).err().unwrap();
        assert_eq!(err.code(), "locked");
        assert!(!dir.path().join(ALARMS_FILE).exists());
    }

    #[test]
    fn uninitialized_dir_is_reported_without_locking() {
        let dir = tempdir().unwrap();
        let err = open_for_write(dir.path()).err().unwrap();
        assert_eq!(err.code(), "not_initialized");
        assert!(!dir.path().join(LOCK_FILE).exists());
    }
}
