use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Task, Urgency};
use crate::reminder::alarm::{AlarmError, TriggerKind};

const FALLBACK_BODY: &str = "Don't forget to complete this task!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    MarkComplete,
    Snooze,
}

impl NotificationAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::MarkComplete => "Complete",
            Self::Snooze => "Snooze",
        }
    }
}

/// A reminder ready to show. One notification per task is visible at a time,
/// keyed by `task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub task_id: i64,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_line: Option<String>,
    pub kind: TriggerKind,
    pub actions: Vec<NotificationAction>,
}

/// Build the notification for a task as of `today`.
pub fn build_notification(task: &Task, kind: TriggerKind, today: NaiveDate) -> Notification {
    let deadline = task.deadline_date();
    let urgency = deadline.map(|d| Urgency::classify(d, today));
    let deadline_line = deadline.zip(urgency).map(|(date, urgency)| match urgency {
        Urgency::Overdue => "Overdue!".to_string(),
        Urgency::DueToday => "Due today!".to_string(),
        Urgency::DueSoon | Urgency::DueLater => format!("Due {}", date.format("%b %d")),
    });
    let marker = urgency.unwrap_or(Urgency::DueLater).marker();

    let body = task
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(FALLBACK_BODY)
        .to_string();
    let topic_line = task
        .topic
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase);

    Notification {
        task_id: task.id,
        title: format!("{marker} {}", task.title),
        body,
        urgency,
        deadline_line,
        topic_line,
        kind,
        actions: vec![NotificationAction::MarkComplete, NotificationAction::Snooze],
    }
}

/// Platform capability that shows and dismisses notifications.
pub trait Notifier {
    fn deliver(&self, notification: &Notification) -> Result<(), AlarmError>;

    fn dismiss(&self, _task_id: i64) {}
}

/// Keeps delivered notifications in memory, newest last.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    delivered: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.delivered.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for CollectingNotifier {
    fn deliver(&self, notification: &Notification) -> Result<(), AlarmError> {
        match self.delivered.lock() {
            Ok(mut guard) => guard.push(notification.clone()),
            Err(poisoned) => poisoned.into_inner().push(notification.clone()),
        }
        Ok(())
    }

    fn dismiss(&self, task_id: i64) {
        match self.delivered.lock() {
            Ok(mut guard) => guard.retain(|n| n.task_id != task_id),
            Err(poisoned) => poisoned.into_inner().retain(|n| n.task_id != task_id),
        }
    }
}
