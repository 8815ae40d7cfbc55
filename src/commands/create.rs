use std::path::Path;

use crate::clock::Clock;
use crate::commands::{open_for_write, optional_text, report_arming, resolve_tags, valid_deadline, valid_title};
use crate::error::Result;
use crate::model::Task;
use crate::output::{self, Format};
use crate::reminder::CollectingNotifier;
use crate::tags::TagManager;

#[allow(clippy::too_many_arguments)]
pub fn run(
    data_dir: &Path,
    clock: &dyn Clock,
    title: String,
    description: Option<String>,
    topic: Option<String>,
    deadline: Option<String>,
    reminder: bool,
    tags: Vec<String>,
    format: Format,
) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;

    let mut task = Task::new(
        valid_title(&title)?,
        description.and_then(optional_text),
        topic.and_then(optional_text),
        clock.now(),
    );
    task.deadline = deadline.as_deref().map(valid_deadline).transpose()?;
    task.reminder_enabled = reminder;
    task.tags = resolve_tags(&TagManager::new(&repo.db), &tags)?;
    task.id = repo.db.add_task(&task)?;

    let notifier = CollectingNotifier::new();
    let report = repo.scheduler(&notifier, clock)?.set_reminder(&task);

    output::print_task(&task, format)?;
    report_arming(&report, format == Format::Pretty);
    Ok(())
}
