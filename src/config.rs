use std::fs;
use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::error::{Result, TodoError};

pub const CONFIG_FILE: &str = "config.yaml";

/// Slots at the end of each task's id block reserved for the snooze trigger
/// and the legacy single-time reminder.
pub const RESERVED_TAIL_SLOTS: u32 = 2;

/// Upper bound for `reminder.window_days` and `agenda.horizon_days`.
pub const MAX_SPAN_DAYS: u32 = 366;

/// Upper bound for `reminder.ids_per_task`. Cancelling a task walks its
/// whole block.
pub const MAX_IDS_PER_TASK: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Days before the deadline date at which the reminder window opens.
    pub window_days: u32,
    /// Trigger times armed on every day of the window, `HH:MM`.
    pub daily_times: Vec<String>,
    pub snooze_minutes: u32,
    /// Size of the trigger-id block reserved per task.
    pub ids_per_task: u32,
    /// Leading slots of the block usable by window triggers.
    pub window_slots: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            daily_times: vec!["09:00".into(), "14:00".into(), "18:00".into()],
            snooze_minutes: 60,
            ids_per_task: 100,
            window_slots: 25,
        }
    }
}

impl ReminderConfig {
    /// Parsed daily times, sorted ascending.
    pub fn times(&self) -> Result<Vec<NaiveTime>> {
        let mut times = self
            .daily_times
            .iter()
            .map(|raw| {
                dates::parse_clock_time(raw).ok_or_else(|| {
                    TodoError::InvalidConfig(format!("daily time '{raw}' is not HH:MM"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        times.sort();
        times.dedup();
        Ok(times)
    }

    pub fn validate(&self) -> Result<()> {
        let times = self.times()?;
        if times.is_empty() {
            return Err(TodoError::InvalidConfig(
                "reminder.daily_times must list at least one time".into(),
            ));
        }
        if self.window_days > MAX_SPAN_DAYS {
            return Err(TodoError::InvalidConfig(format!(
                "reminder.window_days ({}) must be at most {MAX_SPAN_DAYS}",
                self.window_days
            )));
        }
        if self.ids_per_task > MAX_IDS_PER_TASK {
            return Err(TodoError::InvalidConfig(format!(
                "reminder.ids_per_task ({}) must be at most {MAX_IDS_PER_TASK}",
                self.ids_per_task
            )));
        }
        let needed = (self.window_days as usize + 1) * times.len();
        if needed > self.window_slots as usize {
            return Err(TodoError::InvalidConfig(format!(
                "reminder window needs {needed} trigger slots but only {} are reserved",
                self.window_slots
            )));
        }
        let block = self.window_slots.checked_add(RESERVED_TAIL_SLOTS);
        if block.is_none_or(|block| block > self.ids_per_task) {
            return Err(TodoError::InvalidConfig(format!(
                "reminder.ids_per_task ({}) must exceed window_slots ({}) by {RESERVED_TAIL_SLOTS}",
                self.ids_per_task, self.window_slots
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaConfig {
    pub horizon_days: u32,
    pub max_items: usize,
}

impl AgendaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days > MAX_SPAN_DAYS {
            return Err(TodoError::InvalidConfig(format!(
                "agenda.horizon_days ({}) must be at most {MAX_SPAN_DAYS}",
                self.horizon_days
            )));
        }
        Ok(())
    }
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            max_items: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reminder: ReminderConfig,
    pub agenda: AgendaConfig,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reminder: ReminderConfig::default(),
            agenda: AgendaConfig::default(),
            page_size: 20,
        }
    }
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.reminder.validate()?;
        config.agenda.validate()?;
        Ok(config)
    }

    /// Load `config.yaml` from the data directory, falling back to defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_yaml(&raw)
    }
}
