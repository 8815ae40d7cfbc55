use std::path::Path;

use crate::clock::Clock;
use crate::commands::{open_for_write, report_arming};
use crate::error::{Result, TodoError};
use crate::output::{self, Format};
use crate::reminder::CollectingNotifier;

fn set_completed(
    data_dir: &Path,
    clock: &dyn Clock,
    id: i64,
    completed: bool,
    format: Format,
) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let mut task = repo
        .db
        .get_task_by_id(id)?
        .ok_or(TodoError::TaskNotFound(id))?;

    task.set_completed(completed, clock.now());
    if repo.db.update_task(&task)? == 0 {
        return Err(TodoError::TaskNotFound(id));
    }

    let notifier = CollectingNotifier::new();
    let scheduler = repo.scheduler(&notifier, clock)?;
    if completed {
        scheduler.cancel_reminder(id);
        output::print_task(&task, format)?;
    } else {
        let report = scheduler.update_reminder(&task);
        output::print_task(&task, format)?;
        report_arming(&report, format == Format::Pretty);
    }
    Ok(())
}

/// Mark a task complete and cancel its reminders.
pub fn done(data_dir: &Path, clock: &dyn Clock, id: i64, format: Format) -> Result<()> {
    set_completed(data_dir, clock, id, true, format)
}

/// Reopen a task, re-arming reminders if they are enabled.
pub fn reopen(data_dir: &Path, clock: &dyn Clock, id: i64, format: Format) -> Result<()> {
    set_completed(data_dir, clock, id, false, format)
}
