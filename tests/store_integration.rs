use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use todolist::dates;
use todolist::model::Task;
use todolist::stats::StatsReport;
use todolist::store::TodoDb;
use todolist::tags::TagManager;

fn at(s: &str) -> NaiveDateTime {
    dates::parse_timestamp(s).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn task_survives_reopen_with_tags() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let db = TodoDb::from_dir(dir.path()).unwrap();
        let tags = TagManager::new(&db);
        let mut task = Task::new(
            "Pay rent",
            Some("Transfer before noon".into()),
            Some("home".into()),
            at("2024-01-01 09:00:00"),
        );
        task.deadline = Some("2024-01-10".into());
        task.reminder_enabled = true;
        task.add_tag(tags.get_or_create_tag("Urgent").unwrap());
        task.add_tag(tags.get_or_create_tag("bills").unwrap());
        db.add_task(&task).unwrap()
    };

    let db = TodoDb::from_dir(dir.path()).unwrap();
    let task = db.get_task_by_id(id).unwrap().unwrap();
    assert_eq!(task.title, "Pay rent");
    assert_eq!(task.description.as_deref(), Some("Transfer before noon"));
    assert_eq!(task.topic.as_deref(), Some("home"));
    assert_eq!(task.created_date, "2024-01-01 09:00:00");
    assert_eq!(task.deadline.as_deref(), Some("2024-01-10"));
    assert!(task.reminder_enabled);
    assert!(!task.completed);
    let names: Vec<_> = task.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Urgent", "bills"]);
    assert_eq!(db.get_all_tags().unwrap().len(), 6);
}

#[test]
fn multi_tag_task_reads_back_equal() {
    let db = TodoDb::open_memory().unwrap();
    let tags = TagManager::new(&db);
    let mut task = Task::new("Quarterly review", None, Some("work".into()), at("2024-01-01 09:00:00"));
    task.add_tag(tags.get_or_create_tag("Work").unwrap());
    task.add_tag(tags.get_or_create_tag("Personal").unwrap());

    let id = db.add_task(&task).unwrap();
    let loaded = db.get_task_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, Task { id, ..task });
}

#[test]
fn update_replaces_tag_set() {
    let db = TodoDb::open_memory().unwrap();
    let tags = TagManager::new(&db);
    let work = tags.get_or_create_tag("Work").unwrap();
    let study = tags.get_or_create_tag("Study").unwrap();
    let shopping = tags.get_or_create_tag("Shopping").unwrap();

    let mut task = Task::new("Read paper", None, None, at("2024-01-01 09:00:00"));
    task.tags = BTreeSet::from([work.clone(), study.clone()]);
    task.id = db.add_task(&task).unwrap();

    task.tags = BTreeSet::from([shopping.clone()]);
    assert_eq!(db.update_task(&task).unwrap(), 1);
    let stored = db.get_task_by_id(task.id).unwrap().unwrap();
    assert_eq!(stored.tags, BTreeSet::from([shopping]));
}

#[test]
fn deleting_task_removes_links_but_keeps_tags() {
    let db = TodoDb::open_memory().unwrap();
    let tags = TagManager::new(&db);
    let work = tags.get_or_create_tag("Work").unwrap();

    let mut task = Task::new("Ship release", None, None, at("2024-01-01 09:00:00"));
    task.add_tag(work.clone());
    task.id = db.add_task(&task).unwrap();

    assert_eq!(db.delete_task(task.id).unwrap(), 1);
    assert!(db.get_task_by_id(task.id).unwrap().is_none());
    assert!(db.get_tags_for_task(task.id).unwrap().is_empty());
    assert!(db.get_tag_by_id(work.id).unwrap().is_some());
    assert_eq!(db.delete_task(task.id).unwrap(), 0);
}

#[test]
fn deleting_tag_detaches_it_everywhere() {
    let db = TodoDb::open_memory().unwrap();
    let tags = TagManager::new(&db);
    let urgent = tags.get_or_create_tag("Urgent").unwrap();

    let mut first = Task::new("One", None, None, at("2024-01-01 09:00:00"));
    first.add_tag(urgent.clone());
    first.id = db.add_task(&first).unwrap();
    let mut second = Task::new("Two", None, None, at("2024-01-01 09:00:00"));
    second.add_tag(urgent.clone());
    second.id = db.add_task(&second).unwrap();

    assert!(tags.delete_tag(urgent.id).unwrap());
    assert!(db.get_tags_for_task(first.id).unwrap().is_empty());
    assert!(db.get_tags_for_task(second.id).unwrap().is_empty());
    assert!(db.get_tag_by_name("Urgent").unwrap().is_none());
}

#[test]
fn topics_and_counts() {
    let db = TodoDb::open_memory().unwrap();
    let now = at("2024-01-01 09:00:00");
    for (title, topic) in [("a", Some("work")), ("b", Some("home")), ("c", Some("work")), ("d", None)] {
        db.add_task(&Task::new(title, None, topic.map(String::from), now))
            .unwrap();
    }
    let mut done = db.get_tasks_by_topic("work").unwrap().remove(0);
    done.set_completed(true, now);
    db.update_task(&done).unwrap();

    assert_eq!(db.get_all_topics().unwrap(), vec!["home", "work"]);
    assert_eq!(db.get_total_task_count().unwrap(), 4);
    assert_eq!(db.get_task_count_by_topic("work").unwrap(), 2);
    assert_eq!(db.get_completed_tasks_count().unwrap(), 1);
    assert_eq!(db.get_pending_tasks_count().unwrap(), 3);

    let titles: Vec<_> = db
        .get_all_tasks_page(2, 1)
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["c", "b"]);
}

#[test]
fn stats_over_mixed_history() {
    let db = TodoDb::open_memory().unwrap();

    let mut on_time = Task::new("Pay rent", None, None, at("2024-01-01 09:00:00"));
    on_time.deadline = Some("2024-01-10".into());
    on_time.set_completed(true, at("2024-01-09 12:00:00"));
    db.add_task(&on_time).unwrap();

    let mut late = Task::new("File taxes", None, None, at("2024-01-02 09:00:00"));
    late.deadline = Some("2024-01-05".into());
    late.set_completed(true, at("2024-01-06 10:00:00"));
    db.add_task(&late).unwrap();

    let mut no_deadline = Task::new("Tidy desk", None, None, at("2024-01-03 09:00:00"));
    no_deadline.set_completed(true, at("2024-01-03 10:00:00"));
    db.add_task(&no_deadline).unwrap();

    db.add_task(&Task::new("Plan trip", None, None, at("2024-01-04 09:00:00")))
        .unwrap();

    let report = StatsReport::compute(&db, day(2024, 1, 10)).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.completed, 3);
    assert_eq!(report.pending, 1);
    assert_eq!(report.completion_percent, 75);
    assert!((report.on_time_percent - 50.0).abs() < 1e-9);
    // 8, 4 and 0 days.
    assert!((report.average_completion_days - 4.0).abs() < 1e-9);

    let weekly_total: u64 = report.weekly.iter().map(|b| b.count).sum();
    assert_eq!(weekly_total, 3);
    assert_eq!(report.monthly.len(), 6);
    assert_eq!(report.monthly.last().unwrap().label, "2024-01");
    assert_eq!(report.monthly.last().unwrap().count, 3);
}

#[test]
fn single_task_finished_before_deadline_is_fully_on_time() {
    let db = TodoDb::open_memory().unwrap();
    let mut task = Task::new("Pay rent", None, None, at("2024-01-01 09:00:00"));
    task.deadline = Some("2024-01-10".into());
    task.set_completed(true, at("2024-01-09 12:00:00"));
    db.add_task(&task).unwrap();

    let report = StatsReport::compute(&db, day(2024, 1, 9)).unwrap();
    assert!((report.on_time_percent - 100.0).abs() < 1e-9);
    assert_eq!(report.completion_percent, 100);
}
