use chrono::{Duration, NaiveDate, NaiveDateTime};

use todolist::clock::{Clock, FixedClock};
use todolist::config::ReminderConfig;
use todolist::dates;
use todolist::model::Task;
use todolist::reminder::{
    ActionOutcome, CollectingNotifier, FireOutcome, InMemoryAlarms, NotificationAction,
    ReminderScheduler, SuppressReason, TriggerKind, TriggerPayload,
};
use todolist::store::TodoDb;
use todolist::store::alarms::SqliteAlarms;

fn at(s: &str) -> NaiveDateTime {
    dates::parse_timestamp(s).unwrap()
}

fn rent_task(db: &TodoDb, clock: &dyn Clock) -> Task {
    let mut task = Task::new("Pay rent", None, Some("home".into()), clock.now());
    task.deadline = Some("2024-01-10".into());
    task.reminder_enabled = true;
    task.id = db.add_task(&task).unwrap();
    task
}

fn payload(task: &Task) -> TriggerPayload {
    TriggerPayload {
        task_id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        kind: TriggerKind::Daily,
    }
}

#[test]
fn window_covers_remaining_days_up_to_deadline() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);

    let report = scheduler.set_reminder(&task);
    assert!(report.failed.is_empty());
    assert_eq!(report.armed.len(), 17);

    let armed = alarms.armed();
    assert_eq!(armed.len(), 17);
    let first = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let last = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    for trigger in &armed {
        assert!(trigger.fire_at > clock.now());
        assert!(trigger.fire_at.date() >= first && trigger.fire_at.date() <= last);
        assert_eq!(trigger.payload.task_id, task.id);
        assert_eq!(trigger.payload.kind, TriggerKind::Daily);
    }

    let mut times: Vec<_> = armed.iter().map(|t| t.fire_at).collect();
    times.sort();
    assert_eq!(times[0], at("2024-01-05 14:00:00"));
    assert_eq!(times[1], at("2024-01-05 18:00:00"));
    assert_eq!(times[2], at("2024-01-06 09:00:00"));
    assert_eq!(*times.last().unwrap(), at("2024-01-10 18:00:00"));

    let range = scheduler.range(task.id);
    for trigger in &armed {
        assert!(trigger.id >= range.window(0) && trigger.id < range.snooze());
    }
}

#[test]
fn set_reminder_twice_arms_same_ids() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 00:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);

    scheduler.set_reminder(&task);
    let once = alarms.armed_ids();
    scheduler.set_reminder(&task);
    assert_eq!(alarms.armed_ids(), once);
    assert_eq!(once.len(), 18);
}

#[test]
fn cancel_without_armed_reminders_is_quiet() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 00:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();

    assert!(scheduler.cancel_reminder(42));
    assert!(alarms.is_empty());
}

#[test]
fn deadline_in_the_past_arms_nothing() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-11 08:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);

    let report = scheduler.set_reminder(&task);
    assert!(report.armed.is_empty());
    assert_eq!(report.skipped, None);
    assert!(alarms.is_empty());
}

#[test]
fn completing_from_notification_cancels_everything() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);
    scheduler.set_reminder(&task);
    assert!(!alarms.is_empty());

    let outcome = scheduler
        .handle_action(task.id, NotificationAction::MarkComplete)
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Completed { task_id: task.id });
    assert!(alarms.is_empty());

    let stored = db.get_task_by_id(task.id).unwrap().unwrap();
    assert!(stored.completed);
    assert_eq!(stored.completed_date.as_deref(), Some("2024-01-05 10:00:00"));

    let fired = scheduler.handle_trigger(&payload(&task));
    assert_eq!(
        fired,
        FireOutcome::Suppressed {
            task_id: task.id,
            reason: SuppressReason::Completed
        }
    );
    assert!(notifier.delivered().is_empty());
}

#[test]
fn completing_elsewhere_suppresses_late_fire() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let mut task = rent_task(&db, &clock);
    scheduler.set_reminder(&task);

    task.set_completed(true, clock.now());
    db.update_task(&task).unwrap();
    clock.set(at("2024-01-05 14:00:00"));
    let due = alarms.take_due(clock.now());
    assert_eq!(due.len(), 1);

    let fired = scheduler.handle_trigger(&due[0].payload);
    assert!(matches!(fired, FireOutcome::Suppressed { reason: SuppressReason::Completed, .. }));
    assert!(alarms.is_empty());
    assert!(notifier.delivered().is_empty());
}

#[test]
fn fire_for_open_task_delivers_notification() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-09 08:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);
    scheduler.set_reminder(&task);

    clock.set(at("2024-01-09 09:00:00"));
    let due = alarms.take_due(clock.now());
    let notification = match scheduler.handle_trigger(&due[0].payload) {
        FireOutcome::Delivered { notification } => notification,
        other => panic!("expected delivery, got {other:?}"),
    };
    assert!(notification.title.ends_with("Pay rent"));
    assert_eq!(notification.body, "Don't forget to complete this task!");
    assert_eq!(notification.deadline_line.as_deref(), Some("Due Jan 10"));
    assert_eq!(notification.topic_line.as_deref(), Some("HOME"));
    assert_eq!(notifier.delivered().len(), 1);
}

#[test]
fn fire_for_deleted_task_clears_its_range() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);
    scheduler.set_reminder(&task);
    db.delete_task(task.id).unwrap();

    let fired = scheduler.handle_trigger(&payload(&task));
    assert!(matches!(fired, FireOutcome::Suppressed { reason: SuppressReason::TaskMissing, .. }));
    assert!(alarms.is_empty());
}

#[test]
fn snooze_uses_the_reserved_slot() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-20 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);

    let outcome = scheduler
        .handle_action(task.id, NotificationAction::Snooze)
        .unwrap();
    let until = clock.now() + Duration::minutes(60);
    assert_eq!(outcome, ActionOutcome::Snoozed { task_id: task.id, until });

    let armed = alarms.armed();
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].id, scheduler.range(task.id).snooze());
    assert_eq!(armed[0].payload.kind, TriggerKind::Snooze);

    scheduler
        .handle_action(task.id, NotificationAction::Snooze)
        .unwrap();
    assert_eq!(alarms.len(), 1);
}

#[test]
fn action_on_missing_task_has_no_effect() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();

    let outcome = scheduler
        .handle_action(99, NotificationAction::MarkComplete)
        .unwrap();
    assert_eq!(outcome, ActionOutcome::NoEffect { task_id: 99 });
}

#[test]
fn update_reminder_follows_task_state() {
    let db = TodoDb::open_memory().unwrap();
    let alarms = InMemoryAlarms::new();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-05 10:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let mut task = rent_task(&db, &clock);
    scheduler.set_reminder(&task);
    assert_eq!(alarms.len(), 17);

    task.deadline = Some("2024-01-06".into());
    scheduler.update_reminder(&task);
    assert_eq!(alarms.len(), 5);
    assert!(alarms.armed().iter().all(|t| t.fire_at <= at("2024-01-06 18:00:00")));

    task.reminder_enabled = false;
    scheduler.update_reminder(&task);
    assert!(alarms.is_empty());
}

#[test]
fn persistent_registry_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = TodoDb::from_dir(dir.path()).unwrap();
    let alarms = SqliteAlarms::from_dir(dir.path()).unwrap();
    let notifier = CollectingNotifier::new();
    let clock = FixedClock::new(at("2024-01-09 20:00:00"));
    let scheduler =
        ReminderScheduler::new(&db, &alarms, &notifier, &clock, ReminderConfig::default()).unwrap();
    let task = rent_task(&db, &clock);

    let report = scheduler.set_reminder(&task);
    assert_eq!(report.armed.len(), 3);
    assert_eq!(alarms.count().unwrap(), 3);

    clock.set(at("2024-01-10 14:30:00"));
    let due = alarms.due(clock.now()).unwrap();
    assert_eq!(due.len(), 2);
    for trigger in &due {
        alarms.remove(trigger.id).unwrap();
        assert!(matches!(
            scheduler.handle_trigger(&trigger.payload),
            FireOutcome::Delivered { .. }
        ));
    }
    assert_eq!(alarms.count().unwrap(), 1);
    assert_eq!(notifier.delivered().len(), 2);
}
