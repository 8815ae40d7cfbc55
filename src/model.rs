use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dates;

/// A reusable, colored label. Names are unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Tags order by name, then id, so a task's tag set iterates the way the
/// store lists it.
impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then(self.id.cmp(&other.id))
            .then_with(|| self.color.cmp(&other.color))
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A to-do item.
///
/// `completed_date` is set exactly when `completed` is true; use
/// [`Task::set_completed`] rather than flipping the flag directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub completed: bool,
    pub created_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub reminder_enabled: bool,
    /// Single-timestamp reminder written by older builds. Persisted, never armed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<Tag>,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        topic: Option<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            description,
            topic,
            created_date: dates::format_timestamp(now),
            ..Self::default()
        }
    }

    /// Flip completion state, stamping or clearing `completed_date` on a transition.
    pub fn set_completed(&mut self, completed: bool, now: NaiveDateTime) {
        if completed && !self.completed {
            self.completed_date = Some(dates::format_timestamp(now));
        } else if !completed {
            self.completed_date = None;
        }
        self.completed = completed;
    }

    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline.as_deref().and_then(dates::parse_deadline)
    }

    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn add_tag(&mut self, tag: Tag) {
        if !self.has_tag(tag.id) {
            self.tags.insert(tag);
        }
    }

    pub fn remove_tag(&mut self, tag_id: i64) {
        self.tags.retain(|t| t.id != tag_id);
    }
}

/// How pressing a deadline is relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    DueToday,
    DueSoon,
    DueLater,
}

impl Urgency {
    pub const SOON_DAYS: i64 = 3;

    pub fn classify(deadline: NaiveDate, today: NaiveDate) -> Self {
        Self::from_days_left((deadline - today).num_days())
    }

    pub fn from_days_left(days_left: i64) -> Self {
        match days_left {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            d if d <= Self::SOON_DAYS => Self::DueSoon,
            _ => Self::DueLater,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Self::Overdue => "🚨",
            Self::DueToday => "⚠️",
            Self::DueSoon => "⏳",
            Self::DueLater => "⏰",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overdue => write!(f, "overdue"),
            Self::DueToday => write!(f, "due_today"),
            Self::DueSoon => write!(f, "due_soon"),
            Self::DueLater => write!(f, "due_later"),
        }
    }
}
