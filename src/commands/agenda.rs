use std::path::Path;

use colored::Colorize;

use crate::agenda::Agenda;
use crate::clock::Clock;
use crate::error::Result;
use crate::output::{self, Format};
use crate::store::repo::Repo;

pub fn run(data_dir: &Path, clock: &dyn Clock, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let agenda = Agenda::build(&repo.db, clock.today(), &repo.config.agenda)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string(&agenda)?),
        Format::Pretty => {
            if agenda.items.is_empty() {
                println!("{}", "Nothing due this week.".dimmed());
                return Ok(());
            }
            for item in &agenda.items {
                println!(
                    "{} {} {} {}",
                    format!("#{}", item.task_id).cyan(),
                    output::urgency_label(item.urgency),
                    item.title.bold(),
                    item.deadline.format("(%b %d)").to_string().dimmed()
                );
            }
            let hidden = agenda.total - agenda.items.len();
            if hidden > 0 {
                println!("{}", format!("... and {hidden} more").dimmed());
            }
        }
        Format::Minimal => {
            for item in &agenda.items {
                println!("{} {} {} {}", item.task_id, item.deadline, item.days_left, item.title);
            }
        }
    }
    Ok(())
}
