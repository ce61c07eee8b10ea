//! Integration tests for `SqliteMedium`, alone and underneath a `Planner`.

use chrono::{Duration, Utc};
use studyplan_core::{
  Planner,
  medium::Medium,
  schedule::{ClockTime, Day, NewSchedule},
  store::keys,
  subject::{NewSubject, Priority},
  task::{NewTask, TaskKind},
};

use crate::SqliteMedium;

fn medium() -> SqliteMedium { SqliteMedium::open_in_memory().expect("in-memory store") }

fn t(s: &str) -> ClockTime { s.parse().unwrap() }

// ─── Raw key-value access ────────────────────────────────────────────────────

#[test]
fn missing_key_reads_none() {
  let m = medium();
  assert!(m.get("subjects").unwrap().is_none());
  assert!(m.keys().unwrap().is_empty());
}

#[test]
fn set_then_overwrite() {
  let mut m = medium();
  m.set("subjects", "[]").unwrap();
  m.set("subjects", "[1]").unwrap();
  assert_eq!(m.get("subjects").unwrap().as_deref(), Some("[1]"));
  assert_eq!(m.keys().unwrap(), vec!["subjects"]);
}

#[test]
fn remove_deletes_the_row() {
  let mut m = medium();
  m.set("tasks", "[]").unwrap();
  m.remove("tasks").unwrap();
  assert!(m.get("tasks").unwrap().is_none());
  // Removing an absent key is not an error.
  m.remove("tasks").unwrap();
}

#[test]
fn set_many_writes_every_entry() {
  let mut m = medium();
  m.set_many(&[("a", "1".to_owned()), ("b", "2".to_owned()), ("a", "3".to_owned())])
    .unwrap();
  assert_eq!(m.get("a").unwrap().as_deref(), Some("3"));
  assert_eq!(m.get("b").unwrap().as_deref(), Some("2"));
}

#[test]
fn reopening_a_file_keeps_data() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("planner.db");

  {
    let mut m = SqliteMedium::open(&path).unwrap();
    m.set("settings", r#"{"theme":"dark","lastBackup":null}"#).unwrap();
  }

  let m = SqliteMedium::open(&path).unwrap();
  assert_eq!(
    m.get("settings").unwrap().as_deref(),
    Some(r#"{"theme":"dark","lastBackup":null}"#)
  );
}

// ─── Through the planner ─────────────────────────────────────────────────────

#[test]
fn planner_cascade_over_sqlite() {
  let mut p = Planner::new(medium());
  let math = p.add_subject(NewSubject::new("Math", Priority::High)).unwrap();
  p.add_schedule(NewSchedule {
    subject_id: math.id.clone(),
    day:        Day::Monday,
    start_time: t("09:00"),
    end_time:   t("10:00"),
    note:       None,
  })
  .unwrap();
  p.add_task(NewTask {
    subject_id: math.id.clone(),
    title:      "Quiz".into(),
    kind:       TaskKind::Exam,
    deadline:   Utc::now() + Duration::days(1),
  })
  .unwrap();

  let removed = p.delete_subject(&math.id).unwrap().unwrap();
  assert_eq!((removed.schedules, removed.tasks), (1, 1));
  assert!(p.subjects().unwrap().is_empty());
  assert!(p.schedules().unwrap().is_empty());
  assert!(p.tasks().unwrap().is_empty());

  let keys_written = p.store().medium().keys().unwrap();
  assert_eq!(
    keys_written,
    vec![keys::SCHEDULES, keys::SETTINGS, keys::SUBJECTS, keys::TASKS]
  );
}

#[test]
fn planner_state_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("planner.db");

  let id = {
    let mut p = Planner::new(SqliteMedium::open(&path).unwrap());
    p.add_subject(NewSubject::new("History", Priority::Low)).unwrap().id
  };

  let p = Planner::new(SqliteMedium::open(&path).unwrap());
  let subject = p.subject(&id).unwrap().expect("subject persisted");
  assert_eq!(subject.name, "History");
  assert!(p.settings().unwrap().last_backup.is_some());
}

#[test]
fn export_from_sqlite_imports_into_fresh_store() {
  let mut source = Planner::new(medium());
  let chem = source.add_subject(NewSubject::new("Chemistry", Priority::Medium)).unwrap();
  source
    .add_schedule(NewSchedule {
      subject_id: chem.id.clone(),
      day:        Day::Wednesday,
      start_time: t("13:00"),
      end_time:   t("14:30"),
      note:       Some("Lab B".into()),
    })
    .unwrap();
  source
    .add_task(NewTask {
      subject_id: chem.id.clone(),
      title:      "Titration report".into(),
      kind:       TaskKind::Custom("lab report".into()),
      deadline:   Utc::now() + Duration::days(5),
    })
    .unwrap();

  let document = source.export(Utc::now()).unwrap();
  let mut target = Planner::new(medium());
  target.import(&document).unwrap();

  for key in [keys::SUBJECTS, keys::SCHEDULES, keys::TASKS, keys::SETTINGS] {
    assert_eq!(
      target.store().medium().get(key).unwrap(),
      source.store().medium().get(key).unwrap(),
      "{key} differs after round trip"
    );
  }
}
