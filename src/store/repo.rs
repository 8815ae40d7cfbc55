use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::clock::Clock;
use crate::config::{CONFIG_FILE, Config};
use crate::error::{Result, TodoError};
use crate::reminder::{Notifier, ReminderScheduler};
use crate::store::alarms::SqliteAlarms;
use crate::store::db::{DB_FILE, TodoDb};

pub const DATA_DIR_ENV: &str = "TODOLIST_DIR";
pub const DEFAULT_DATA_DIR: &str = ".todolist";

/// Everything a command needs from one data directory: the task store, the
/// alarm registry and the loaded configuration.
pub struct Repo {
    pub data_dir: PathBuf,
    pub db: TodoDb,
    pub alarms: SqliteAlarms,
    pub config: Config,
}

impl Repo {
    /// Create the data directory, the store at the current schema version and
    /// a default `config.yaml` if none exists. Safe to run on an existing
    /// directory.
    pub fn init(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, serde_yaml::to_string(&Config::default())?)?;
        }
        let repo = Self::open_unchecked(data_dir)?;
        info!(data_dir = %data_dir.display(), "store initialized");
        Ok(repo)
    }

    /// Open an initialized data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        Self::ensure_initialized(data_dir)?;
        Self::open_unchecked(data_dir)
    }

    pub fn ensure_initialized(data_dir: &Path) -> Result<()> {
        if !data_dir.join(DB_FILE).exists() {
            return Err(TodoError::NotInitialized);
        }
        Ok(())
    }

    fn open_unchecked(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let db = TodoDb::from_dir(data_dir)?;
        let alarms = SqliteAlarms::from_dir(data_dir)?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            db,
            alarms,
            config,
        })
    }

    /// A scheduler wired to this directory's store and alarm registry.
    pub fn scheduler<'a>(
        &'a self,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
    ) -> Result<ReminderScheduler<'a>> {
        ReminderScheduler::new(
            &self.db,
            &self.alarms,
            notifier,
            clock,
            self.config.reminder.clone(),
        )
    }
}

/// Pick the data directory: explicit flag, then `TODOLIST_DIR`, then
/// `./.todolist`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}
