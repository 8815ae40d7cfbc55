use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use todolist::clock::{Clock, FixedClock, SystemClock};
use todolist::commands;
use todolist::commands::edit::TaskEdits;
use todolist::error::TodoError;
use todolist::output::Format;
use todolist::reminder::NotificationAction;
use todolist::store::repo::resolve_data_dir;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todolist", version, about = "Local to-do list with deadline reminders")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Data directory (defaults to $TODOLIST_DIR, then ./.todolist)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Pin "now" to a fixed local time, YYYY-MM-DD HH:MM:SS
    #[arg(long, global = true, hide = true, env = "TODOLIST_NOW")]
    now: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and store
    Init,
    /// Add a task
    Add {
        /// Task title
        title: String,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short)]
        topic: Option<String>,
        /// Deadline date, YYYY-MM-DD (a time part is accepted and ignored for reminders)
        #[arg(long)]
        deadline: Option<String>,
        /// Arm daily reminders in the week before the deadline
        #[arg(long)]
        remind: bool,
        /// Tags to attach, by name or id (comma-separated, created if missing)
        #[arg(long, value_delimiter = ',')]
        tag: Vec<String>,
    },
    /// List tasks, newest first
    List {
        #[arg(long, short)]
        topic: Option<String>,
        /// Page size (defaults to page_size from config when paging)
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show one task
    Show { id: i64 },
    /// Change fields of a task (pass an empty string to clear a field)
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short)]
        topic: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        /// Turn reminders on or off
        #[arg(long, value_enum)]
        remind: Option<Toggle>,
        /// Replace all tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tag: Option<Vec<String>>,
    },
    /// Mark a task complete
    Done { id: i64 },
    /// Mark a completed task as open again
    Reopen { id: i64 },
    /// Delete a task and its tag links
    Delete { id: i64 },
    /// List distinct topics
    Topics,
    /// Count tasks
    Count {
        #[arg(long, short)]
        topic: Option<String>,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Completion statistics
    Stats,
    /// Open tasks due within the next week
    Agenda,
    /// Deadline reminders
    Remind {
        #[command(subcommand)]
        action: RemindAction,
    },
    /// App-lock PIN
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },
}

#[derive(Subcommand)]
enum TagAction {
    /// Create a tag (returns the existing tag if the name is taken)
    Add {
        name: String,
        /// #RRGGBB; a palette color is picked when omitted
        #[arg(long)]
        color: Option<String>,
    },
    /// List tags, optionally filtered by a case-insensitive substring
    List { query: Option<String> },
    /// Rename or recolor a tag
    Rename {
        /// Tag id or name
        tag: String,
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a tag and detach it from every task
    Delete { tag: String },
    /// Attach a tag to a task
    Attach { task: i64, tag: String },
    /// Detach a tag from a task
    Detach { task: i64, tag: String },
}

#[derive(Subcommand)]
enum RemindAction {
    /// Enable reminders for a task and arm them
    Set { id: i64 },
    /// Disable reminders for a task and cancel them
    Cancel { id: i64 },
    /// Deliver every reminder that is due
    FireDue,
    /// List armed reminders
    Pending {
        #[arg(long)]
        task: Option<i64>,
    },
    /// Act on a reminder notification
    Action {
        id: i64,
        #[arg(value_enum)]
        action: ActionArg,
    },
}

#[derive(Subcommand)]
enum PinAction {
    /// Store a 4-digit PIN
    Set { pin: String },
    /// Check a PIN, exit 1 on mismatch
    Verify { pin: String },
    /// Remove the stored PIN
    Clear,
    /// Report whether a PIN is set
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    Complete,
    Snooze,
}

impl From<ActionArg> for NotificationAction {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Complete => Self::MarkComplete,
            ActionArg::Snooze => Self::Snooze,
        }
    }
}

fn clock_from(now: Option<&str>) -> todolist::error::Result<Box<dyn Clock>> {
    match now {
        Some(raw) => {
            let at = todolist::dates::parse_timestamp(raw)
                .ok_or_else(|| TodoError::InvalidDate(raw.to_string()))?;
            Ok(Box::new(FixedClock::new(at)))
        }
        None => Ok(Box::new(SystemClock)),
    }
}

/// Returns `Ok(false)` when the command ran but should exit non-zero.
fn run(cli: Cli, format: Format) -> todolist::error::Result<bool> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let clock = clock_from(cli.now.as_deref())?;
    let clock = clock.as_ref();
    let dir = data_dir.as_path();

    match cli.command {
        Commands::Init => commands::init::run(dir, format)?,
        Commands::Add {
            title,
            description,
            topic,
            deadline,
            remind,
            tag,
        } => commands::create::run(
            dir,
            clock,
            title,
            description,
            topic,
            deadline,
            remind,
            tag,
            format,
        )?,
        Commands::List {
            topic,
            limit,
            offset,
        } => commands::list::run(dir, topic, limit, offset, format)?,
        Commands::Show { id } => commands::show::run(dir, id, format)?,
        Commands::Edit {
            id,
            title,
            description,
            topic,
            deadline,
            remind,
            tag,
        } => {
            let edits = TaskEdits {
                title,
                description,
                topic,
                deadline,
                reminder: remind.map(|t| matches!(t, Toggle::On)),
                tags: tag,
            };
            commands::edit::run(dir, clock, id, edits, format)?
        }
        Commands::Done { id } => commands::lifecycle::done(dir, clock, id, format)?,
        Commands::Reopen { id } => commands::lifecycle::reopen(dir, clock, id, format)?,
        Commands::Delete { id } => commands::delete::run(dir, clock, id, format)?,
        Commands::Topics => commands::list::topics(dir, format)?,
        Commands::Count { topic } => commands::list::count(dir, topic, format)?,
        Commands::Tag { action } => match action {
            TagAction::Add { name, color } => {
                commands::tag::add(dir, &name, color.as_deref(), format)?
            }
            TagAction::List { query } => commands::tag::list(dir, query.as_deref(), format)?,
            TagAction::Rename { tag, name, color } => commands::tag::rename(
                dir,
                &tag,
                name.as_deref(),
                color.as_deref(),
                format,
            )?,
            TagAction::Delete { tag } => commands::tag::delete(dir, &tag, format)?,
            TagAction::Attach { task, tag } => commands::tag::attach(dir, task, &tag, format)?,
            TagAction::Detach { task, tag } => commands::tag::detach(dir, task, &tag, format)?,
        },
        Commands::Stats => commands::stats::run(dir, clock, format)?,
        Commands::Agenda => commands::agenda::run(dir, clock, format)?,
        Commands::Remind { action } => match action {
            RemindAction::Set { id } => commands::remind::set(dir, clock, id, format)?,
            RemindAction::Cancel { id } => commands::remind::cancel(dir, clock, id, format)?,
            RemindAction::FireDue => commands::remind::fire_due(dir, clock, format)?,
            RemindAction::Pending { task } => commands::remind::pending(dir, task, format)?,
            RemindAction::Action { id, action } => {
                commands::remind::action(dir, clock, id, action.into(), format)?
            }
        },
        Commands::Pin { action } => match action {
            PinAction::Set { pin } => commands::pin::set(dir, &pin, format)?,
            PinAction::Verify { pin } => return commands::pin::verify(dir, &pin, format),
            PinAction::Clear => commands::pin::clear(dir, format)?,
            PinAction::Status => commands::pin::status(dir, format)?,
        },
    }
    Ok(true)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    match run(cli, format) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            match format {
                Format::Json => {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": e.code(),
                            "message": e.to_string()
                        })
                    );
                }
                _ => eprintln!("error: {e}"),
            }
            std::process::exit(1);
        }
    }
}
