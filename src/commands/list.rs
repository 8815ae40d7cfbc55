use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::output::{self, Format};
use crate::store::repo::Repo;

/// List tasks, newest first. Passing `limit` or `offset` pages the result,
/// with `page_size` from the config as the default limit.
pub fn run(
    data_dir: &Path,
    topic: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
    format: Format,
) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let paged = limit.is_some() || offset.is_some();
    let limit = limit.unwrap_or(repo.config.page_size);
    let offset = offset.unwrap_or(0);

    let tasks = match (topic.as_deref(), paged) {
        (Some(topic), true) => repo.db.get_tasks_by_topic_page(topic, limit, offset)?,
        (Some(topic), false) => repo.db.get_tasks_by_topic(topic)?,
        (None, true) => repo.db.get_all_tasks_page(limit, offset)?,
        (None, false) => repo.db.get_all_tasks()?,
    };
    output::print_tasks(&tasks, format)
}

pub fn topics(data_dir: &Path, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let topics = repo.db.get_all_topics()?;
    match format {
        Format::Json => println!("{}", serde_json::to_string(&topics)?),
        Format::Pretty => {
            if topics.is_empty() {
                println!("{}", "No topics.".dimmed());
            }
            for topic in &topics {
                let count = repo.db.get_task_count_by_topic(topic)?;
                println!("{} {}", topic.cyan(), format!("({count})").dimmed());
            }
        }
        Format::Minimal => {
            for topic in &topics {
                println!("{topic}");
            }
        }
    }
    Ok(())
}

pub fn count(data_dir: &Path, topic: Option<String>, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    if let Some(topic) = topic {
        let n = repo.db.get_task_count_by_topic(&topic)?;
        match format {
            Format::Json => println!("{}", serde_json::json!({ "topic": topic, "total": n })),
            Format::Pretty => println!("{}: {}", topic.cyan(), n.to_string().bold()),
            Format::Minimal => println!("{n}"),
        }
        return Ok(());
    }

    let total = repo.db.get_total_task_count()?;
    let completed = repo.db.get_completed_tasks_count()?;
    let pending = repo.db.get_pending_tasks_count()?;
    match format {
        Format::Json => println!(
            "{}",
            serde_json::json!({ "total": total, "completed": completed, "pending": pending })
        ),
        Format::Pretty => println!(
            "{} total, {} completed, {} pending",
            total.to_string().bold(),
            completed.to_string().green(),
            pending.to_string().yellow()
        ),
        Format::Minimal => println!("{total} {completed} {pending}"),
    }
    Ok(())
}
