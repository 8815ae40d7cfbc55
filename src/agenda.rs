use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::config::AgendaConfig;
use crate::error::Result;
use crate::model::{Task, Urgency};
use crate::store::TodoDb;

/// Compact feed of open tasks due soon, as shown by a home-screen widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agenda {
    pub items: Vec<AgendaItem>,
    /// Matching tasks before the `max_items` cap.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaItem {
    pub task_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub deadline: NaiveDate,
    pub days_left: i64,
    pub urgency: Urgency,
}

impl Agenda {
    pub fn build(db: &TodoDb, today: NaiveDate, config: &AgendaConfig) -> Result<Self> {
        let tasks = db.get_tasks_with_deadlines()?;
        Ok(Self::from_tasks(&tasks, today, config))
    }

    /// Open tasks whose deadline date lies in `[today, today + horizon_days]`,
    /// earliest first.
    pub fn from_tasks(tasks: &[Task], today: NaiveDate, config: &AgendaConfig) -> Self {
        let horizon_end = today
            .checked_add_days(Days::new(u64::from(config.horizon_days)))
            .unwrap_or(NaiveDate::MAX);
        let mut items: Vec<AgendaItem> = tasks
            .iter()
            .filter(|task| !task.completed)
            .filter_map(|task| {
                let deadline = task.deadline_date()?;
                if deadline < today || deadline > horizon_end {
                    return None;
                }
                let days_left = (deadline - today).num_days();
                Some(AgendaItem {
                    task_id: task.id,
                    title: task.title.clone(),
                    topic: task.topic.clone(),
                    deadline,
                    days_left,
                    urgency: Urgency::from_days_left(days_left),
                })
            })
            .collect();
        items.sort_by_key(|item| (item.deadline, item.task_id));

        let total = items.len();
        if total > config.max_items {
            debug!(total, shown = config.max_items, "agenda truncated");
            items.truncate(config.max_items);
        }
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn due(id: i64, deadline: &str, completed: bool) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            deadline: Some(deadline.into()),
            completed,
            ..Task::default()
        }
    }

    #[test]
    fn keeps_open_tasks_inside_horizon() {
        let tasks = vec![
            due(1, "2024-01-04", false),
            due(2, "2024-01-05 18:00", false),
            due(3, "2024-01-12", false),
            due(4, "2024-01-13", false),
            due(5, "2024-01-06", true),
            due(6, "soon", false),
        ];
        let agenda = Agenda::from_tasks(&tasks, day(5), &AgendaConfig::default());
        let ids: Vec<_> = agenda.items.iter().map(|i| i.task_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(agenda.items[0].urgency, Urgency::DueToday);
        assert_eq!(agenda.items[1].days_left, 7);
        assert_eq!(agenda.total, 2);
    }

    #[test]
    fn caps_items_but_reports_total() {
        let tasks: Vec<_> = (1..=5).map(|id| due(id, "2024-01-07", false)).collect();
        let config = AgendaConfig {
            horizon_days: 7,
            max_items: 3,
        };
        let agenda = Agenda::from_tasks(&tasks, day(5), &config);
        assert_eq!(agenda.items.len(), 3);
        assert_eq!(agenda.total, 5);
        assert_eq!(agenda.items[0].urgency, Urgency::DueSoon);
    }

    #[test]
    fn huge_horizon_clamps_to_calendar_end() {
        let tasks = vec![due(1, "2024-01-06", false), due(2, "9999-12-31", false)];
        let config = AgendaConfig {
            horizon_days: u32::MAX,
            max_items: 8,
        };
        let agenda = Agenda::from_tasks(&tasks, day(5), &config);
        assert_eq!(agenda.total, 2);
    }

    #[test]
    fn builds_from_store() {
        let db = TodoDb::open_memory().unwrap();
        db.add_task(&due(0, "2024-01-06", false)).unwrap();
        db.add_task(&Task {
            title: "no deadline".into(),
            ..Task::default()
        })
        .unwrap();
        let agenda = Agenda::build(&db, day(5), &AgendaConfig::default()).unwrap();
        assert_eq!(agenda.total, 1);
        assert_eq!(agenda.items[0].title, "task 0");
    }
}
