use std::path::Path;

use crate::clock::Clock;
use crate::commands::{open_for_write, optional_text, report_arming, resolve_tags, valid_deadline, valid_title};
use crate::error::{Result, TodoError};
use crate::output::{self, Format};
use crate::reminder::CollectingNotifier;
use crate::tags::TagManager;

/// Field changes for `edit`. For optional text fields, an empty string clears
/// the value.
#[derive(Debug, Default)]
pub struct TaskEdits {
    pub title: Option<String>,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub deadline: Option<String>,
    pub reminder: Option<bool>,
    /// Replaces the whole tag set when present.
    pub tags: Option<Vec<String>>,
}

pub fn run(
    data_dir: &Path,
    clock: &dyn Clock,
    id: i64,
    edits: TaskEdits,
    format: Format,
) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let mut task = repo
        .db
        .get_task_by_id(id)?
        .ok_or(TodoError::TaskNotFound(id))?;

    if let Some(title) = edits.title {
        task.title = valid_title(&title)?;
    }
    if let Some(description) = edits.description {
        task.description = optional_text(description);
    }
    if let Some(topic) = edits.topic {
        task.topic = optional_text(topic);
    }
    if let Some(deadline) = edits.deadline {
        task.deadline = match optional_text(deadline) {
            Some(raw) => Some(valid_deadline(&raw)?),
            None => None,
        };
    }
    if let Some(reminder) = edits.reminder {
        task.reminder_enabled = reminder;
    }
    if let Some(names) = edits.tags {
        task.tags = resolve_tags(&TagManager::new(&repo.db), &names)?;
    }

    if repo.db.update_task(&task)? == 0 {
        return Err(TodoError::TaskNotFound(id));
    }

    let notifier = CollectingNotifier::new();
    let report = repo.scheduler(&notifier, clock)?.update_reminder(&task);

    let task = repo.db.get_task_by_id(id)?.unwrap_or(task);
    output::print_task(&task, format)?;
    report_arming(&report, format == Format::Pretty);
    Ok(())
}
