use chrono::{Days, Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::ReminderConfig;
use crate::dates;
use crate::error::Result;
use crate::model::Task;
use crate::reminder::alarm::{AlarmError, AlarmService, TriggerId, TriggerKind, TriggerPayload};
use crate::reminder::notify::{Notification, NotificationAction, Notifier, build_notification};
use crate::store::TodoDb;

/// Block of trigger ids owned by one task.
///
/// Window triggers use the leading `window_slots` ids, followed by one
/// snooze slot and one slot for the legacy single-time reminder. The whole
/// block can be cancelled without knowing how many triggers were armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRange {
    pub base: TriggerId,
    pub window_slots: u32,
}

impl TriggerRange {
    pub fn for_task(task_id: i64, config: &ReminderConfig) -> Self {
        Self {
            base: task_id * i64::from(config.ids_per_task),
            window_slots: config.window_slots,
        }
    }

    pub fn window(&self, slot: u32) -> TriggerId {
        self.base + i64::from(slot)
    }

    pub fn snooze(&self) -> TriggerId {
        self.base + i64::from(self.window_slots)
    }

    pub fn legacy(&self) -> TriggerId {
        self.base + i64::from(self.window_slots) + 1
    }

    /// Every id in the block, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TriggerId> + use<> {
        let base = self.base;
        (0..=i64::from(self.window_slots) + 1).map(move |offset| base + offset)
    }
}

/// A trigger the scheduler intends to arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTrigger {
    pub id: TriggerId,
    pub fire_at: NaiveDateTime,
}

/// Why `set_reminder` armed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ReminderDisabled,
    NoDeadline,
    Completed,
    UnreadableDeadline,
}

/// Result of arming a task's reminders. Registration failures are counted,
/// never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArmReport {
    pub task_id: i64,
    pub armed: Vec<PlannedTrigger>,
    pub failed: Vec<TriggerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl ArmReport {
    fn skipped(task_id: i64, reason: SkipReason) -> Self {
        Self {
            task_id,
            skipped: Some(reason),
            ..Self::default()
        }
    }

    pub fn armed_ids(&self) -> Vec<TriggerId> {
        self.armed.iter().map(|t| t.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    TaskMissing,
    Completed,
    ReminderDisabled,
    StoreUnavailable,
    DeliveryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum FireOutcome {
    Delivered { notification: Notification },
    Suppressed { task_id: i64, reason: SuppressReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ActionOutcome {
    Completed { task_id: i64 },
    Snoozed { task_id: i64, until: NaiveDateTime },
    /// The task vanished, or the completion write touched no row.
    NoEffect { task_id: i64 },
    /// The alarm service refused the snooze trigger.
    SnoozeFailed { task_id: i64, reason: String },
}

/// Turns task deadlines into armed triggers and reacts when they fire.
pub struct ReminderScheduler<'a> {
    db: &'a TodoDb,
    alarms: &'a dyn AlarmService,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
    config: ReminderConfig,
    times: Vec<NaiveTime>,
}

impl<'a> ReminderScheduler<'a> {
    pub fn new(
        db: &'a TodoDb,
        alarms: &'a dyn AlarmService,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
        config: ReminderConfig,
    ) -> Result<Self> {
        config.validate()?;
        let times = config.times()?;
        Ok(Self {
            db,
            alarms,
            notifier,
            clock,
            config,
            times,
        })
    }

    pub fn range(&self, task_id: i64) -> TriggerRange {
        TriggerRange::for_task(task_id, &self.config)
    }

    /// Triggers the task should have armed right now, or why it needs none.
    ///
    /// The window runs from `window_days` before the deadline date through the
    /// deadline date itself. Slot ids follow each trigger's position in the
    /// full window, so the same trigger keeps its id whatever "now" is.
    pub fn plan(&self, task: &Task) -> std::result::Result<Vec<PlannedTrigger>, SkipReason> {
        if !task.reminder_enabled {
            return Err(SkipReason::ReminderDisabled);
        }
        if task.completed {
            return Err(SkipReason::Completed);
        }
        let raw = match task.deadline.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(SkipReason::NoDeadline),
        };
        let Some(deadline) = dates::parse_deadline(raw) else {
            warn!(task_id = task.id, deadline = raw, "unreadable deadline, no reminders armed");
            return Err(SkipReason::UnreadableDeadline);
        };

        let now = self.clock.now();
        let window_end = dates::end_of_day(deadline);
        let Some(first_day) =
            deadline.checked_sub_days(Days::new(u64::from(self.config.window_days)))
        else {
            warn!(task_id = task.id, deadline = raw, "reminder window starts before the calendar does");
            return Err(SkipReason::UnreadableDeadline);
        };
        let range = self.range(task.id);

        let mut planned = Vec::new();
        let mut slot = 0u32;
        for day in first_day.iter_days().take_while(|d| *d <= deadline) {
            for time in &self.times {
                let fire_at = day.and_time(*time);
                if fire_at > now && fire_at <= window_end {
                    planned.push(PlannedTrigger {
                        id: range.window(slot),
                        fire_at,
                    });
                }
                slot += 1;
            }
        }
        Ok(planned)
    }

    /// Arm the deadline-window triggers for a task.
    ///
    /// Does nothing unless reminders are enabled, a deadline is set and the
    /// task is open. Otherwise every trigger in the task's range is cancelled
    /// first, then each future trigger is armed.
    pub fn set_reminder(&self, task: &Task) -> ArmReport {
        let planned = match self.plan(task) {
            Ok(planned) => planned,
            Err(reason) => {
                debug!(task_id = task.id, ?reason, "reminder not armed");
                return ArmReport::skipped(task.id, reason);
            }
        };

        self.cancel_reminder(task.id);

        let payload = TriggerPayload {
            task_id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            kind: TriggerKind::Daily,
        };
        let mut report = ArmReport {
            task_id: task.id,
            ..ArmReport::default()
        };
        for trigger in planned {
            match self.alarms.schedule(trigger.id, trigger.fire_at, &payload) {
                Ok(()) => report.armed.push(trigger),
                Err(err) => {
                    warn!(task_id = task.id, trigger_id = trigger.id, %err, "failed to arm reminder");
                    report.failed.push(trigger.id);
                }
            }
        }
        info!(
            task_id = task.id,
            armed = report.armed.len(),
            failed = report.failed.len(),
            deadline = task.deadline.as_deref().unwrap_or_default(),
            "reminders armed"
        );
        report
    }

    /// Cancel every trigger in the task's reserved range, armed or not.
    /// Returns `false` if the alarm service refused any cancellation.
    pub fn cancel_reminder(&self, task_id: i64) -> bool {
        let mut all_ok = true;
        for id in self.range(task_id).ids() {
            if let Err(err) = self.alarms.cancel(id) {
                warn!(task_id, trigger_id = id, %err, "failed to cancel reminder");
                all_ok = false;
            }
        }
        debug!(task_id, "reminders cancelled");
        all_ok
    }

    /// Re-derive the task's triggers from its current state.
    pub fn update_reminder(&self, task: &Task) -> ArmReport {
        self.cancel_reminder(task.id);
        if task.reminder_enabled {
            self.set_reminder(task)
        } else {
            ArmReport::skipped(task.id, SkipReason::ReminderDisabled)
        }
    }

    /// React to a fired trigger.
    ///
    /// The task is re-read so a completion or opt-out that happened after
    /// arming suppresses the notification and clears the task's range.
    pub fn handle_trigger(&self, payload: &TriggerPayload) -> FireOutcome {
        let task_id = payload.task_id;
        let suppress = |reason: SuppressReason| {
            debug!(task_id, ?reason, "reminder suppressed");
            FireOutcome::Suppressed { task_id, reason }
        };

        let task = match self.db.get_task_by_id(task_id) {
            Ok(Some(task)) => task,
            Ok(None) => {
                self.cancel_reminder(task_id);
                return suppress(SuppressReason::TaskMissing);
            }
            Err(err) => {
                warn!(task_id, %err, "could not load task for fired reminder");
                return suppress(SuppressReason::StoreUnavailable);
            }
        };
        if task.completed {
            self.cancel_reminder(task_id);
            return suppress(SuppressReason::Completed);
        }
        if !task.reminder_enabled {
            self.cancel_reminder(task_id);
            return suppress(SuppressReason::ReminderDisabled);
        }

        let notification = build_notification(&task, payload.kind, self.clock.today());
        if let Err(err) = self.notifier.deliver(&notification) {
            warn!(task_id, %err, "failed to deliver reminder");
            return suppress(SuppressReason::DeliveryFailed);
        }
        FireOutcome::Delivered { notification }
    }

    /// Apply a notification action chosen by the user.
    pub fn handle_action(&self, task_id: i64, action: NotificationAction) -> Result<ActionOutcome> {
        let Some(mut task) = self.db.get_task_by_id(task_id)? else {
            self.notifier.dismiss(task_id);
            return Ok(ActionOutcome::NoEffect { task_id });
        };
        self.notifier.dismiss(task_id);

        match action {
            NotificationAction::MarkComplete => {
                task.set_completed(true, self.clock.now());
                if self.db.update_task(&task)? == 0 {
                    return Ok(ActionOutcome::NoEffect { task_id });
                }
                self.cancel_reminder(task_id);
                info!(task_id, "task completed from reminder");
                Ok(ActionOutcome::Completed { task_id })
            }
            NotificationAction::Snooze => match self.snooze(&task) {
                Ok(until) => Ok(ActionOutcome::Snoozed { task_id, until }),
                Err(err) => {
                    warn!(task_id, error = %err, "failed to arm snooze trigger");
                    Ok(ActionOutcome::SnoozeFailed {
                        task_id,
                        reason: err.to_string(),
                    })
                }
            },
        }
    }

    /// Arm the task's single snooze trigger `snooze_minutes` from now.
    pub fn snooze(&self, task: &Task) -> std::result::Result<NaiveDateTime, AlarmError> {
        let until = self.clock.now() + Duration::minutes(i64::from(self.config.snooze_minutes));
        let payload = TriggerPayload {
            task_id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            kind: TriggerKind::Snooze,
        };
        let id = self.range(task.id).snooze();
        self.alarms.schedule(id, until, &payload)?;
        info!(task_id = task.id, until = %until, "reminder snoozed");
        Ok(until)
    }
}
