use std::path::Path;

use colored::Colorize;

use crate::clock::Clock;
use crate::commands::open_for_write;
use crate::error::{Result, TodoError};
use crate::output::Format;
use crate::reminder::CollectingNotifier;

pub fn run(data_dir: &Path, clock: &dyn Clock, id: i64, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    if repo.db.get_task_by_id(id)?.is_none() {
        return Err(TodoError::TaskNotFound(id));
    }

    let notifier = CollectingNotifier::new();
    repo.scheduler(&notifier, clock)?.cancel_reminder(id);
    let removed = repo.db.delete_task(id)?;
    if removed == 0 {
        return Err(TodoError::TaskNotFound(id));
    }

    match format {
        Format::Json => println!("{}", serde_json::json!({ "deleted": id })),
        Format::Pretty => println!("{} task {}", "Deleted".red(), id),
        Format::Minimal => println!("{id}"),
    }
    Ok(())
}
