//! Planner behaviour against an in-memory medium.

use chrono::{Duration, TimeZone, Utc};

use crate::{
  EntityId, Error, Planner, ValidationError,
  medium::{Medium, MemoryMedium},
  schedule::{ClockTime, Day, NewSchedule, Schedule, SchedulePatch},
  settings::{Settings, SettingsPatch, Theme},
  store::keys,
  subject::{NewSubject, Priority, Subject, SubjectPatch},
  task::{NewTask, Task, TaskKind, TaskPatch},
};

fn planner() -> Planner<MemoryMedium> { Planner::new(MemoryMedium::new()) }

fn t(s: &str) -> ClockTime { s.parse().unwrap() }

fn add_subject(p: &mut Planner<MemoryMedium>, name: &str) -> Subject {
  p.add_subject(NewSubject::new(name, Priority::High)).unwrap()
}

fn new_slot(subject: &Subject, day: Day, start: &str, end: &str) -> NewSchedule {
  NewSchedule {
    subject_id: subject.id.clone(),
    day,
    start_time: t(start),
    end_time: t(end),
    note: None,
  }
}

fn new_task(subject: &Subject, title: &str) -> NewTask {
  NewTask {
    subject_id: subject.id.clone(),
    title:      title.into(),
    kind:       TaskKind::Exam,
    deadline:   Utc::now() + Duration::days(3),
  }
}

fn validation(err: Error) -> ValidationError {
  match err {
    Error::Validation(v) => v,
    other => panic!("expected a validation error, got {other:?}"),
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[test]
fn add_subject_assigns_id_colour_and_trims_name() {
  let mut p = planner();
  let math = p.add_subject(NewSubject::new("  Math ", Priority::High)).unwrap();
  assert_eq!(math.name, "Math");
  assert_eq!(math.priority, Priority::High);
  assert!(crate::subject::PALETTE.contains(&math.color.as_str()));
  assert_eq!(p.subject(&math.id).unwrap(), Some(math));
}

#[test]
fn empty_subject_name_is_rejected_without_writing() {
  let mut p = planner();
  let err = p.add_subject(NewSubject::new("   ", Priority::Low)).unwrap_err();
  assert_eq!(validation(err), ValidationError::EmptySubjectName);
  assert!(p.store().medium().is_empty());
}

#[test]
fn duplicate_check_ignores_case_and_own_id() {
  let mut p = planner();
  let math = add_subject(&mut p, "Math");

  assert!(p.is_duplicate_subject("math", None).unwrap());
  assert!(p.is_duplicate_subject("MATH", None).unwrap());
  assert!(!p.is_duplicate_subject("Math", Some(&math.id)).unwrap());
  assert!(!p.is_duplicate_subject("Physics", None).unwrap());

  let err = p.add_subject(NewSubject::new("mAtH", Priority::Low)).unwrap_err();
  assert_eq!(validation(err), ValidationError::DuplicateSubject("mAtH".into()));
}

#[test]
fn rename_to_own_name_is_allowed_but_not_to_anothers() {
  let mut p = planner();
  let math = add_subject(&mut p, "Math");
  add_subject(&mut p, "Physics");

  let renamed = p
    .update_subject(&math.id, SubjectPatch { name: Some("MATH".into()), ..Default::default() })
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "MATH");
  assert_eq!(renamed.color, math.color);
  assert_eq!(renamed.created_at, math.created_at);

  let err = p
    .update_subject(&math.id, SubjectPatch { name: Some("physics".into()), ..Default::default() })
    .unwrap_err();
  assert!(matches!(validation(err), ValidationError::DuplicateSubject(_)));
}

#[test]
fn update_of_missing_entity_is_a_noop() {
  let mut p = planner();
  let ghost = EntityId::from("ghost");

  assert!(p.update_subject(&ghost, SubjectPatch::default()).unwrap().is_none());
  assert!(p.update_schedule(&ghost, SchedulePatch::default()).unwrap().is_none());
  assert!(p.update_task(&ghost, TaskPatch::default()).unwrap().is_none());
  assert!(p.toggle_task(&ghost).unwrap().is_none());
  assert!(p.delete_task(&ghost).unwrap().is_none());
  assert!(p.delete_schedule(&ghost).unwrap().is_none());
  assert!(p.delete_subject(&ghost).unwrap().is_none());

  assert!(p.store().medium().is_empty(), "no-op calls must not write");
}

#[test]
fn delete_subject_cascades_to_schedules_and_tasks() {
  let mut p = planner();
  let math = add_subject(&mut p, "Math");
  let physics = add_subject(&mut p, "Physics");

  p.add_schedule(new_slot(&math, Day::Monday, "09:00", "10:00")).unwrap();
  p.add_schedule(new_slot(&math, Day::Tuesday, "09:00", "10:00")).unwrap();
  p.add_schedule(new_slot(&physics, Day::Monday, "10:00", "11:00")).unwrap();
  p.add_task(new_task(&math, "Problem set")).unwrap();
  p.add_task(new_task(&physics, "Lab report")).unwrap();

  let removed = p.delete_subject(&math.id).unwrap().unwrap();
  assert_eq!(removed.subject.id, math.id);
  assert_eq!(removed.schedules, 2);
  assert_eq!(removed.tasks, 1);

  assert!(p.subject(&math.id).unwrap().is_none());
  assert!(p.schedules_for_subject(&math.id).unwrap().is_empty());
  assert!(p.tasks_for_subject(&math.id).unwrap().is_empty());
  assert_eq!(p.schedules().unwrap().len(), 1);
  assert_eq!(p.tasks().unwrap().len(), 1);
}

// ─── Schedules ───────────────────────────────────────────────────────────────

#[test]
fn monday_scenario_overlap_rejected_touching_accepted() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");

  p.add_schedule(new_slot(&a, Day::Monday, "09:00", "10:00")).unwrap();

  let err = p.add_schedule(new_slot(&a, Day::Monday, "09:30", "10:30")).unwrap_err();
  assert!(matches!(validation(err), ValidationError::ScheduleConflict { day: Day::Monday, .. }));

  p.add_schedule(new_slot(&a, Day::Monday, "10:00", "11:00")).unwrap();
  assert_eq!(p.schedules().unwrap().len(), 2);
}

#[test]
fn inserted_slot_never_conflicts_with_itself() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  for (day, start, end) in [
    (Day::Sunday, "00:00", "23:59"),
    (Day::Monday, "09:00", "09:01"),
    (Day::Saturday, "12:15", "18:45"),
  ] {
    let slot = p.add_schedule(new_slot(&a, day, start, end)).unwrap();
    assert!(!p.has_schedule_conflict(day, t(start), t(end), Some(&slot.id)).unwrap());
    assert!(p.has_schedule_conflict(day, t(start), t(end), None).unwrap());
  }
}

#[test]
fn conflicting_schedule_reports_the_existing_slot() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let first = p.add_schedule(new_slot(&a, Day::Thursday, "14:00", "16:00")).unwrap();

  let hit = p.conflicting_schedule(Day::Thursday, t("15:00"), t("17:00"), None).unwrap();
  assert_eq!(hit, Some(first));
  assert!(p.conflicting_schedule(Day::Friday, t("15:00"), t("17:00"), None).unwrap().is_none());
}

#[test]
fn schedule_time_range_must_run_forwards() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let err = p.add_schedule(new_slot(&a, Day::Monday, "10:00", "10:00")).unwrap_err();
  assert!(matches!(validation(err), ValidationError::InvalidTimeRange { .. }));
  assert!(p.schedules().unwrap().is_empty());
}

#[test]
fn schedule_requires_existing_subject() {
  let mut p = planner();
  let err = p
    .add_schedule(NewSchedule {
      subject_id: "ghost".into(),
      day:        Day::Monday,
      start_time: t("09:00"),
      end_time:   t("10:00"),
      note:       Some("room 3".into()),
    })
    .unwrap_err();
  assert_eq!(validation(err), ValidationError::UnknownSubject("ghost".into()));
}

#[test]
fn editing_a_slot_checks_others_but_not_itself() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let morning = p.add_schedule(new_slot(&a, Day::Monday, "09:00", "10:00")).unwrap();
  p.add_schedule(new_slot(&a, Day::Monday, "11:00", "12:00")).unwrap();

  // Stretching within its own footprint is fine.
  let stretched = p
    .update_schedule(&morning.id, SchedulePatch { end_time: Some(t("11:00")), ..Default::default() })
    .unwrap()
    .unwrap();
  assert_eq!(stretched.end_time, t("11:00"));
  assert_eq!(stretched.created_at, morning.created_at);

  // Stretching into the next slot is not.
  let err = p
    .update_schedule(&morning.id, SchedulePatch { end_time: Some(t("11:30")), ..Default::default() })
    .unwrap_err();
  assert!(matches!(validation(err), ValidationError::ScheduleConflict { .. }));
  assert_eq!(p.schedule(&morning.id).unwrap().unwrap().end_time, t("11:00"));

  // Moving to another day frees it up.
  let moved = p
    .update_schedule(
      &morning.id,
      SchedulePatch { day: Some(Day::Tuesday), end_time: Some(t("12:00")), ..Default::default() },
    )
    .unwrap()
    .unwrap();
  assert_eq!(moved.day, Day::Tuesday);
}

#[test]
fn delete_schedule_returns_removed_slot() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let slot = p.add_schedule(new_slot(&a, Day::Monday, "09:00", "10:00")).unwrap();
  assert_eq!(p.delete_schedule(&slot.id).unwrap(), Some(slot));
  assert!(p.schedules().unwrap().is_empty());
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

#[test]
fn new_tasks_start_incomplete_and_toggle_is_an_involution() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let task = p.add_task(new_task(&a, "  Midterm ")).unwrap();
  assert_eq!(task.title, "Midterm");
  assert!(!task.completed);

  assert!(p.toggle_task(&task.id).unwrap().unwrap().completed);
  assert!(!p.toggle_task(&task.id).unwrap().unwrap().completed);
  assert_eq!(p.task(&task.id).unwrap(), Some(task));
}

#[test]
fn task_validation() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");

  let err = p.add_task(new_task(&a, " ")).unwrap_err();
  assert_eq!(validation(err), ValidationError::EmptyTaskTitle);

  let mut orphan = new_task(&a, "Essay");
  orphan.subject_id = "ghost".into();
  let err = p.add_task(orphan).unwrap_err();
  assert!(matches!(validation(err), ValidationError::UnknownSubject(_)));
  assert!(p.tasks().unwrap().is_empty());
}

#[test]
fn update_task_merges_fields() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let task = p.add_task(new_task(&a, "Essay")).unwrap();

  let updated = p
    .update_task(
      &task.id,
      TaskPatch { kind: Some(TaskKind::Custom("draft".into())), ..Default::default() },
    )
    .unwrap()
    .unwrap();
  assert_eq!(updated.kind, TaskKind::Custom("draft".into()));
  assert_eq!(updated.title, "Essay");
  assert_eq!(updated.deadline, task.deadline);
}

// ─── Settings & backup stamp ─────────────────────────────────────────────────

#[test]
fn collection_writes_stamp_backup_but_settings_writes_do_not() {
  let mut p = planner();
  let settings = p.update_settings(SettingsPatch { theme: Some(Theme::Dark) }).unwrap();
  assert_eq!(settings.theme, Theme::Dark);
  assert!(p.settings().unwrap().last_backup.is_none());

  add_subject(&mut p, "A");
  let settings = p.settings().unwrap();
  assert!(settings.last_backup.is_some());
  assert_eq!(settings.theme, Theme::Dark);
}

#[test]
fn reset_clears_everything() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  p.add_task(new_task(&a, "Essay")).unwrap();
  p.update_settings(SettingsPatch { theme: Some(Theme::Dark) }).unwrap();

  p.reset().unwrap();
  assert!(p.subjects().unwrap().is_empty());
  assert!(p.tasks().unwrap().is_empty());
  assert_eq!(p.settings().unwrap(), Settings::default());
}

// ─── Export / import ─────────────────────────────────────────────────────────

#[test]
fn export_import_round_trip_on_empty_store() {
  let source = planner();
  let at = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
  let document = source.export(at).unwrap();

  let mut target = planner();
  target.import(&document).unwrap();
  assert!(target.subjects().unwrap().is_empty());
  assert!(target.schedules().unwrap().is_empty());
  assert!(target.tasks().unwrap().is_empty());
  assert_eq!(target.settings().unwrap(), source.settings().unwrap());
}

#[test]
fn export_import_round_trip_is_byte_equivalent() {
  let mut source = planner();
  let a = add_subject(&mut source, "Algebra");
  let b = add_subject(&mut source, "Biology");
  source.add_schedule(new_slot(&a, Day::Monday, "09:00", "10:00")).unwrap();
  source.add_schedule(new_slot(&b, Day::Monday, "10:00", "11:30")).unwrap();
  let task = source.add_task(new_task(&b, "Reading")).unwrap();
  source.toggle_task(&task.id).unwrap();

  let document = source.export(Utc::now()).unwrap();
  let mut target = planner();
  let summary = target.import(&document).unwrap();
  assert_eq!(summary.subjects, Some(2));
  assert_eq!(summary.schedules, Some(2));
  assert_eq!(summary.tasks, Some(1));

  for key in [keys::SUBJECTS, keys::SCHEDULES, keys::TASKS, keys::SETTINGS] {
    assert_eq!(
      target.store().medium().get(key).unwrap(),
      source.store().medium().get(key).unwrap(),
      "{key} differs after round trip"
    );
  }
}

#[test]
fn import_replaces_collections_wholesale() {
  let mut p = planner();
  add_subject(&mut p, "Old");

  let doc = r##"{
    "subjects": [{
      "id": "legacy1", "name": "New", "priority": "low",
      "color": "#f59e0b", "createdAt": "2024-01-01T00:00:00.000Z"
    }]
  }"##;
  p.import(doc).unwrap();

  let subjects = p.subjects().unwrap();
  assert_eq!(subjects.len(), 1);
  assert_eq!(subjects[0].id.as_str(), "legacy1");
  assert!(p.settings().unwrap().last_backup.is_some());
}

#[test]
fn failed_import_leaves_state_untouched() {
  let mut p = planner();
  let a = add_subject(&mut p, "A");
  let before = p.export(Utc::now()).unwrap();

  assert!(matches!(p.import("not json at all"), Err(Error::Import(_))));
  assert!(matches!(p.import("42"), Err(Error::Import(_))));
  assert!(matches!(p.import("[]"), Err(Error::Import(_))));
  assert!(matches!(
    p.import(r#"{ "schedules": [{ "id": "x", "startTime": "25:00" }] }"#),
    Err(Error::Import(_))
  ));

  assert_eq!(p.subjects().unwrap(), vec![a]);
  let after = p.export(Utc::now()).unwrap();
  let strip = |doc: &str| {
    let mut value: serde_json::Value = serde_json::from_str(doc).unwrap();
    value.as_object_mut().unwrap().remove("exportDate");
    value
  };
  assert_eq!(strip(&before), strip(&after));
}

// ─── Medium failures ─────────────────────────────────────────────────────────

#[derive(Default)]
struct ReadOnlyMedium(MemoryMedium);

impl Medium for ReadOnlyMedium {
  type Error = std::io::Error;

  fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
    Ok(self.0.get(key).unwrap_or_default())
  }

  fn set(&mut self, _key: &str, _value: &str) -> Result<(), Self::Error> {
    Err(std::io::Error::other("medium is read-only"))
  }

  fn remove(&mut self, _key: &str) -> Result<(), Self::Error> {
    Err(std::io::Error::other("medium is read-only"))
  }
}

#[test]
fn medium_write_failures_propagate() {
  let mut p = Planner::new(ReadOnlyMedium::default());
  let err = p.add_subject(NewSubject::new("Math", Priority::Low)).unwrap_err();
  assert!(matches!(err, Error::Medium(_)));
  assert!(p.subjects().unwrap().is_empty());
}

#[test]
fn stored_order_is_preserved() {
  let mut p = planner();
  let names = ["Zoology", "Art", "Music"];
  for name in names {
    add_subject(&mut p, name);
  }
  let stored: Vec<String> = p.subjects().unwrap().into_iter().map(|s| s.name).collect();
  assert_eq!(stored, names);
  let _: Vec<Schedule> = p.schedules().unwrap();
  let _: Vec<Task> = p.tasks().unwrap();
}
