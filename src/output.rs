use clap::ValueEnum;
use colored::Colorize;

use crate::error::Result;
use crate::model::{Tag, Task, Urgency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

pub fn print_task(task: &Task, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(&task)?),
        Format::Pretty => {
            let check = if task.completed {
                "[x]".green()
            } else {
                "[ ]".normal()
            };
            let title = if task.completed {
                task.title.dimmed().to_string()
            } else {
                task.title.bold().to_string()
            };
            println!("{} {} {}", format!("#{}", task.id).cyan(), check, title);
            if let Some(ref desc) = task.description {
                println!("  {}", desc);
            }
            if let Some(ref topic) = task.topic {
                println!("  {} {}", "topic:".dimmed(), topic);
            }
            if let Some(ref deadline) = task.deadline {
                let reminder = if task.reminder_enabled { "on" } else { "off" };
                println!(
                    "  {} {} {} {}",
                    "deadline:".dimmed(),
                    deadline,
                    "reminder:".dimmed(),
                    reminder
                );
            }
            if !task.tags.is_empty() {
                println!("  {} {}", "tags:".dimmed(), tag_names(&task.tags));
            }
            println!("  {} {}", "created:".dimmed(), task.created_date);
            if let Some(ref done) = task.completed_date {
                println!("  {} {}", "completed:".dimmed(), done);
            }
        }
        Format::Minimal => println!("{}", minimal_task_line(task)),
    }
    Ok(())
}

pub fn print_tasks(tasks: &[Task], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(tasks)?),
        Format::Pretty => {
            if tasks.is_empty() {
                println!("{}", "No tasks.".dimmed());
            }
            for task in tasks {
                print_task(task, Format::Pretty)?;
                println!();
            }
        }
        Format::Minimal => {
            println!("{:>4} {:1} {:24} {:12} DEADLINE", "ID", "", "TITLE", "TOPIC");
            println!("{}", "-".repeat(56));
            for task in tasks {
                println!("{}", minimal_task_line(task));
            }
        }
    }
    Ok(())
}

fn minimal_task_line(task: &Task) -> String {
    let check = if task.completed { "x" } else { " " };
    format!(
        "{:>4} {:1} {:24} {:12} {}",
        task.id,
        check,
        truncate_title(&task.title, 24),
        truncate_title(task.topic.as_deref().unwrap_or("-"), 12),
        task.deadline.as_deref().unwrap_or("-")
    )
}

pub fn print_tag(tag: &Tag, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(tag)?),
        Format::Pretty => println!("{} {} {}", format!("#{}", tag.id).cyan(), tag.name.bold(), tag.color.dimmed()),
        Format::Minimal => println!("{} {} {}", tag.id, tag.name, tag.color),
    }
    Ok(())
}

pub fn print_tags(tags: &[Tag], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(tags)?),
        _ => {
            if tags.is_empty() && format == Format::Pretty {
                println!("{}", "No tags.".dimmed());
            }
            for tag in tags {
                print_tag(tag, format)?;
            }
        }
    }
    Ok(())
}

pub fn tag_names<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> String {
    tags.into_iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn urgency_label(urgency: Urgency) -> String {
    let text = format!("{} {}", urgency.marker(), urgency);
    match urgency {
        Urgency::Overdue => text.red().bold().to_string(),
        Urgency::DueToday => text.yellow().bold().to_string(),
        Urgency::DueSoon => text.yellow().to_string(),
        Urgency::DueLater => text.normal().to_string(),
    }
}

pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        let truncated: String = title.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_long_title() {
        assert_eq!(truncate_title("Buy groceries for dinner", 12), "Buy groce...");
    }

    #[test]
    fn truncate_short_title_untouched() {
        assert_eq!(truncate_title("Pay rent", 12), "Pay rent");
    }

    #[test]
    fn tag_names_joined_in_order() {
        let tags = vec![Tag::new("Home", "#000000"), Tag::new("Work", "#FFFFFF")];
        assert_eq!(tag_names(&tags), "Home, Work");
    }

    #[test]
    fn minimal_line_marks_completion() {
        let task = Task {
            id: 7,
            title: "Pay rent".into(),
            completed: true,
            deadline: Some("2024-01-10".into()),
            ..Task::default()
        };
        let line = minimal_task_line(&task);
        assert!(line.starts_with("   7 x Pay rent"));
        assert!(line.ends_with("2024-01-10"));
    }
}
