//! Deadline-window reminders: trigger planning, platform alarm seams and
//! notification content.

pub mod alarm;
pub mod notify;
pub mod scheduler;

pub use alarm::{AlarmError, AlarmService, ArmedTrigger, InMemoryAlarms, TriggerId, TriggerKind, TriggerPayload};
pub use notify::{CollectingNotifier, Notification, NotificationAction, Notifier, build_notification};
pub use scheduler::{ActionOutcome, ArmReport, FireOutcome, ReminderScheduler, SkipReason, SuppressReason, TriggerRange};
