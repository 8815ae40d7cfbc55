use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable numeric id of one scheduled trigger.
pub type TriggerId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// One of the daily triggers inside a deadline window.
    Daily,
    /// A single trigger re-armed from a notification's snooze action.
    Snooze,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Snooze => write!(f, "snooze"),
        }
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "snooze" => Ok(Self::Snooze),
            other => Err(AlarmError::Rejected(format!("unknown trigger kind '{other}'"))),
        }
    }
}

/// Data handed back to the scheduler when a trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub task_id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: TriggerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedTrigger {
    pub id: TriggerId,
    pub fire_at: NaiveDateTime,
    pub payload: TriggerPayload,
}

#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("alarm service unavailable: {0}")]
    Unavailable(String),

    #[error("alarm rejected: {0}")]
    Rejected(String),

    #[error("alarm storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Platform capability that wakes the app at a point in time.
///
/// Scheduling an id that is already armed replaces it. Cancelling an id that
/// was never armed succeeds and does nothing.
pub trait AlarmService {
    fn schedule(
        &self,
        id: TriggerId,
        fire_at: NaiveDateTime,
        payload: &TriggerPayload,
    ) -> Result<(), AlarmError>;

    fn cancel(&self, id: TriggerId) -> Result<(), AlarmError>;
}

/// Process-local trigger registry.
#[derive(Debug, Default)]
pub struct InMemoryAlarms {
    armed: Mutex<BTreeMap<TriggerId, ArmedTrigger>>,
}

impl InMemoryAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every armed trigger, ordered by id.
    pub fn armed(&self) -> Vec<ArmedTrigger> {
        self.lock().values().cloned().collect()
    }

    pub fn armed_ids(&self) -> Vec<TriggerId> {
        self.lock().keys().copied().collect()
    }

    pub fn is_armed(&self, id: TriggerId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return every trigger due at or before `now`, earliest first.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<ArmedTrigger> {
        let mut armed = self.lock();
        let due_ids: Vec<TriggerId> = armed
            .values()
            .filter(|t| t.fire_at <= now)
            .map(|t| t.id)
            .collect();
        let mut due: Vec<ArmedTrigger> = due_ids
            .into_iter()
            .filter_map(|id| armed.remove(&id))
            .collect();
        due.sort_by_key(|t| (t.fire_at, t.id));
        due
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<TriggerId, ArmedTrigger>> {
        match self.armed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AlarmService for InMemoryAlarms {
    fn schedule(
        &self,
        id: TriggerId,
        fire_at: NaiveDateTime,
        payload: &TriggerPayload,
    ) -> Result<(), AlarmError> {
        self.lock().insert(
            id,
            ArmedTrigger {
                id,
                fire_at,
                payload: payload.clone(),
            },
        );
        Ok(())
    }

    fn cancel(&self, id: TriggerId) -> Result<(), AlarmError> {
        self.lock().remove(&id);
        Ok(())
    }
}
