use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::commands::open_for_write;
use crate::error::{Result, TodoError};
use crate::output::{self, Format};
use crate::reminder::{
    ActionOutcome, ArmReport, ArmedTrigger, CollectingNotifier, FireOutcome, NotificationAction,
};
use crate::store::repo::Repo;

fn print_report(report: &ArmReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            if let Some(reason) = report.skipped {
                let reason = serde_json::to_value(reason)?;
                println!(
                    "{} no reminders armed ({})",
                    format!("#{}", report.task_id).cyan(),
                    reason.as_str().unwrap_or_default()
                );
            } else {
                println!(
                    "{} {} reminders armed",
                    format!("#{}", report.task_id).cyan(),
                    report.armed.len().to_string().bold()
                );
                for trigger in &report.armed {
                    println!("  {}", trigger.fire_at.format("%a %b %d %H:%M").to_string().dimmed());
                }
            }
            if !report.failed.is_empty() {
                println!(
                    "  {} {} could not be armed",
                    "warning:".yellow(),
                    report.failed.len()
                );
            }
        }
        Format::Minimal => println!("{}", report.armed.len()),
    }
    Ok(())
}

/// Enable reminders on a task and arm its deadline window.
pub fn set(data_dir: &Path, clock: &dyn Clock, id: i64, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let mut task = repo
        .db
        .get_task_by_id(id)?
        .ok_or(TodoError::TaskNotFound(id))?;
    if !task.reminder_enabled {
        task.reminder_enabled = true;
        repo.db.update_task(&task)?;
    }
    let notifier = CollectingNotifier::new();
    let report = repo.scheduler(&notifier, clock)?.update_reminder(&task);
    print_report(&report, format)
}

/// Disable reminders on a task and cancel everything it has armed.
pub fn cancel(data_dir: &Path, clock: &dyn Clock, id: i64, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let mut task = repo
        .db
        .get_task_by_id(id)?
        .ok_or(TodoError::TaskNotFound(id))?;
    if task.reminder_enabled {
        task.reminder_enabled = false;
        repo.db.update_task(&task)?;
    }
    let notifier = CollectingNotifier::new();
    let cancelled = repo.scheduler(&notifier, clock)?.cancel_reminder(id);
    match format {
        Format::Json => println!(
            "{}",
            serde_json::json!({ "task_id": id, "cancelled": cancelled })
        ),
        Format::Pretty => println!("{} reminders cancelled", format!("#{id}").cyan()),
        Format::Minimal => println!("{cancelled}"),
    }
    Ok(())
}

pub fn pending(data_dir: &Path, task_id: Option<i64>, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let armed = match task_id {
        Some(id) => repo.alarms.list_for_task(id)?,
        None => repo.alarms.list()?,
    };
    print_triggers(&armed, format)
}

fn print_triggers(armed: &[ArmedTrigger], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(armed)?),
        Format::Pretty => {
            if armed.is_empty() {
                println!("{}", "No reminders armed.".dimmed());
            }
            for trigger in armed {
                println!(
                    "{} {} {} {}",
                    trigger.fire_at.format("%Y-%m-%d %H:%M").to_string().bold(),
                    format!("#{}", trigger.payload.task_id).cyan(),
                    trigger.payload.title,
                    format!("({})", trigger.payload.kind).dimmed()
                );
            }
        }
        Format::Minimal => {
            for trigger in armed {
                println!(
                    "{} {} {}",
                    trigger.id,
                    trigger.payload.task_id,
                    crate::dates::format_timestamp(trigger.fire_at)
                );
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Fired {
    trigger_id: i64,
    #[serde(flatten)]
    outcome: FireOutcome,
}

/// Deliver every trigger that is due now. Each fired trigger is consumed
/// whether or not its notification is shown.
pub fn fire_due(data_dir: &Path, clock: &dyn Clock, format: Format) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let notifier = CollectingNotifier::new();
    let scheduler = repo.scheduler(&notifier, clock)?;

    let mut fired = Vec::new();
    for trigger in repo.alarms.due(clock.now())? {
        repo.alarms.remove(trigger.id)?;
        let outcome = scheduler.handle_trigger(&trigger.payload);
        debug!(trigger_id = trigger.id, task_id = trigger.payload.task_id, "trigger fired");
        fired.push(Fired {
            trigger_id: trigger.id,
            outcome,
        });
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string(&fired)?),
        Format::Pretty => {
            let shown = notifier.drain();
            if shown.is_empty() {
                println!("{}", "Nothing due.".dimmed());
            }
            for n in &shown {
                println!("{}", n.title.bold());
                println!("  {}", n.body);
                if let Some(ref line) = n.deadline_line {
                    println!("  {}", line.yellow());
                }
                if let Some(ref topic) = n.topic_line {
                    println!("  {}", topic.dimmed());
                }
                let actions: Vec<_> = n.actions.iter().map(|a| a.label()).collect();
                println!("  {} {}", "actions:".dimmed(), actions.join(" | "));
            }
        }
        Format::Minimal => {
            for f in &fired {
                if let FireOutcome::Delivered { notification } = &f.outcome {
                    println!("{} {}", notification.task_id, notification.title);
                }
            }
        }
    }
    Ok(())
}

/// Apply a notification action to a task.
pub fn action(
    data_dir: &Path,
    clock: &dyn Clock,
    id: i64,
    action: NotificationAction,
    format: Format,
) -> Result<()> {
    let (repo, _lock) = open_for_write(data_dir)?;
    let notifier = CollectingNotifier::new();
    let outcome = repo.scheduler(&notifier, clock)?.handle_action(id, action)?;
    if let ActionOutcome::NoEffect { task_id } = outcome {
        return Err(TodoError::TaskNotFound(task_id));
    }
    match format {
        Format::Json => println!("{}", serde_json::to_string(&outcome)?),
        Format::Pretty => match &outcome {
            ActionOutcome::Completed { task_id } => {
                if let Some(task) = repo.db.get_task_by_id(*task_id)? {
                    output::print_task(&task, Format::Pretty)?;
                }
            }
            ActionOutcome::Snoozed { task_id, until } => println!(
                "{} snoozed until {}",
                format!("#{task_id}").cyan(),
                until.format("%H:%M").to_string().bold()
            ),
            ActionOutcome::SnoozeFailed { task_id, reason } => println!(
                "{} could not be snoozed: {}",
                format!("#{task_id}").cyan(),
                reason.yellow()
            ),
            ActionOutcome::NoEffect { .. } => {}
        },
        Format::Minimal => println!("{id}"),
    }
    Ok(())
}
