//! [`Planner`]: validated mutations and queries over an [`EntityStore`].
//!
//! All creates, updates and deletes go through here. Rules enforced:
//!
//! - subject names are non-empty and unique, ignoring case;
//! - schedules and tasks refer to an existing subject;
//! - a schedule ends after it starts and overlaps no other slot on its day;
//! - deleting a subject deletes its schedules and tasks.
//!
//! Every mutation is a read-modify-write of whole collections and takes
//! `&mut self`, so a planner shared between threads has to sit behind a lock.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
  Result,
  backup::{self, ImportSummary},
  conflict,
  error::ValidationError,
  id::EntityId,
  medium::Medium,
  migrate::{self, MigrationReport},
  schedule::{ClockTime, Day, NewSchedule, Schedule, SchedulePatch},
  settings::{Settings, SettingsPatch},
  store::{Batch, Collection, EntityStore},
  subject::{Color, NewSubject, Subject, SubjectPatch},
  task::{NewTask, Task, TaskPatch},
};

/// What a cascading subject delete removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSubject {
  pub subject:   Subject,
  pub schedules: usize,
  pub tasks:     usize,
}

pub struct Planner<M> {
  store: EntityStore<M>,
}

impl<M: Medium> Planner<M> {
  pub fn new(medium: M) -> Self { Self { store: EntityStore::new(medium) } }

  pub fn store(&self) -> &EntityStore<M> { &self.store }

  pub fn into_medium(self) -> M { self.store.into_medium() }

  // ── Queries ───────────────────────────────────────────────────────────────

  pub fn subjects(&self) -> Result<Vec<Subject>> { self.store.get_all() }

  pub fn schedules(&self) -> Result<Vec<Schedule>> { self.store.get_all() }

  pub fn tasks(&self) -> Result<Vec<Task>> { self.store.get_all() }

  pub fn settings(&self) -> Result<Settings> { self.store.settings() }

  pub fn subject(&self, id: &EntityId) -> Result<Option<Subject>> { self.store.get_by_id(id) }

  pub fn schedule(&self, id: &EntityId) -> Result<Option<Schedule>> { self.store.get_by_id(id) }

  pub fn task(&self, id: &EntityId) -> Result<Option<Task>> { self.store.get_by_id(id) }

  pub fn schedules_for_subject(&self, subject_id: &EntityId) -> Result<Vec<Schedule>> {
    let mut schedules = self.schedules()?;
    schedules.retain(|s| &s.subject_id == subject_id);
    Ok(schedules)
  }

  pub fn tasks_for_subject(&self, subject_id: &EntityId) -> Result<Vec<Task>> {
    let mut tasks = self.tasks()?;
    tasks.retain(|t| &t.subject_id == subject_id);
    Ok(tasks)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  /// Whether another subject (not `exclude`) already uses `name`, ignoring
  /// case.
  pub fn is_duplicate_subject(&self, name: &str, exclude: Option<&EntityId>) -> Result<bool> {
    Ok(name_taken(&self.subjects()?, name, exclude))
  }

  pub fn add_subject(&mut self, input: NewSubject) -> Result<Subject> {
    let mut subjects = self.subjects()?;
    let name = checked_subject_name(&subjects, &input.name, None)?;

    let subject = Subject {
      id: EntityId::generate(),
      name,
      priority: input.priority,
      color: Color::random(),
      created_at: Utc::now(),
    };
    subjects.push(subject.clone());
    self.store.set_all(&subjects)?;

    debug!(id = %subject.id, name = %subject.name, "subject added");
    Ok(subject)
  }

  /// Apply `patch` to the subject `id`. Returns `None` (and writes nothing)
  /// when no such subject exists.
  pub fn update_subject(&mut self, id: &EntityId, patch: SubjectPatch) -> Result<Option<Subject>> {
    let mut subjects = self.subjects()?;
    let Some(index) = position(&subjects, id) else {
      return Ok(None);
    };

    let mut patch = patch;
    if let Some(name) = patch.name.take() {
      patch.name = Some(checked_subject_name(&subjects, &name, Some(id))?);
    }
    patch.apply_to(&mut subjects[index]);
    let updated = subjects[index].clone();
    self.store.set_all(&subjects)?;

    debug!(%id, "subject updated");
    Ok(Some(updated))
  }

  /// Delete the subject `id` along with every schedule and task that refers
  /// to it. All three collections are written in one batch.
  pub fn delete_subject(&mut self, id: &EntityId) -> Result<Option<RemovedSubject>> {
    let mut subjects = self.subjects()?;
    let Some(index) = position(&subjects, id) else {
      return Ok(None);
    };
    let subject = subjects.remove(index);

    let mut schedules = self.schedules()?;
    let schedules_before = schedules.len();
    schedules.retain(|s| &s.subject_id != id);

    let mut tasks = self.tasks()?;
    let tasks_before = tasks.len();
    tasks.retain(|t| &t.subject_id != id);

    let mut batch = Batch::new();
    batch.put_collection(&subjects)?;
    batch.put_collection(&schedules)?;
    batch.put_collection(&tasks)?;
    self.store.commit(batch)?;

    let removed = RemovedSubject {
      subject,
      schedules: schedules_before - schedules.len(),
      tasks: tasks_before - tasks.len(),
    };
    info!(
      %id,
      schedules = removed.schedules,
      tasks = removed.tasks,
      "subject deleted with dependents"
    );
    Ok(Some(removed))
  }

  // ── Schedules ─────────────────────────────────────────────────────────────

  /// Whether `[start, end)` on `day` overlaps any slot other than `exclude`.
  pub fn has_schedule_conflict(
    &self,
    day: Day,
    start: ClockTime,
    end: ClockTime,
    exclude: Option<&EntityId>,
  ) -> Result<bool> {
    Ok(self.conflicting_schedule(day, start, end, exclude)?.is_some())
  }

  /// The first slot, in stored order, that `[start, end)` on `day` overlaps.
  pub fn conflicting_schedule(
    &self,
    day: Day,
    start: ClockTime,
    end: ClockTime,
    exclude: Option<&EntityId>,
  ) -> Result<Option<Schedule>> {
    let schedules = self.schedules()?;
    Ok(conflict::find_conflict(&schedules, day, start, end, exclude).cloned())
  }

  pub fn add_schedule(&mut self, input: NewSchedule) -> Result<Schedule> {
    self.require_subject(&input.subject_id)?;
    let mut schedules = self.schedules()?;
    conflict::check_slot(&schedules, input.day, input.start_time, input.end_time, None)?;

    let schedule = Schedule {
      id:         EntityId::generate(),
      subject_id: input.subject_id,
      day:        input.day,
      start_time: input.start_time,
      end_time:   input.end_time,
      note:       input.note.unwrap_or_default(),
      created_at: Utc::now(),
    };
    schedules.push(schedule.clone());
    self.store.set_all(&schedules)?;

    debug!(id = %schedule.id, day = %schedule.day, "schedule added");
    Ok(schedule)
  }

  /// Apply `patch` to the slot `id`, re-validating the merged slot against
  /// every other slot.
  pub fn update_schedule(
    &mut self,
    id: &EntityId,
    patch: SchedulePatch,
  ) -> Result<Option<Schedule>> {
    let mut schedules = self.schedules()?;
    let Some(index) = position(&schedules, id) else {
      return Ok(None);
    };
    if let Some(subject_id) = &patch.subject_id {
      self.require_subject(subject_id)?;
    }

    let mut candidate = schedules[index].clone();
    patch.apply_to(&mut candidate);
    conflict::check_slot(
      &schedules,
      candidate.day,
      candidate.start_time,
      candidate.end_time,
      Some(id),
    )?;

    schedules[index] = candidate.clone();
    self.store.set_all(&schedules)?;

    debug!(%id, "schedule updated");
    Ok(Some(candidate))
  }

  pub fn delete_schedule(&mut self, id: &EntityId) -> Result<Option<Schedule>> {
    self.remove_by_id::<Schedule>(id)
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  pub fn add_task(&mut self, input: NewTask) -> Result<Task> {
    let title = checked_task_title(&input.title)?;
    self.require_subject(&input.subject_id)?;

    let task = Task {
      id: EntityId::generate(),
      subject_id: input.subject_id,
      title,
      kind: input.kind,
      deadline: input.deadline,
      completed: false,
      created_at: Utc::now(),
    };
    let mut tasks = self.tasks()?;
    tasks.push(task.clone());
    self.store.set_all(&tasks)?;

    debug!(id = %task.id, "task added");
    Ok(task)
  }

  pub fn update_task(&mut self, id: &EntityId, patch: TaskPatch) -> Result<Option<Task>> {
    let mut tasks = self.tasks()?;
    let Some(index) = position(&tasks, id) else {
      return Ok(None);
    };

    let mut patch = patch;
    if let Some(title) = patch.title.take() {
      patch.title = Some(checked_task_title(&title)?);
    }
    if let Some(subject_id) = &patch.subject_id {
      self.require_subject(subject_id)?;
    }
    patch.apply_to(&mut tasks[index]);
    let updated = tasks[index].clone();
    self.store.set_all(&tasks)?;

    debug!(%id, "task updated");
    Ok(Some(updated))
  }

  /// Flip the task's `completed` flag.
  pub fn toggle_task(&mut self, id: &EntityId) -> Result<Option<Task>> {
    let mut tasks = self.tasks()?;
    let Some(task) = tasks.iter_mut().find(|t| &t.id == id) else {
      return Ok(None);
    };
    task.completed = !task.completed;
    let toggled = task.clone();
    self.store.set_all(&tasks)?;

    debug!(%id, completed = toggled.completed, "task toggled");
    Ok(Some(toggled))
  }

  pub fn delete_task(&mut self, id: &EntityId) -> Result<Option<Task>> {
    self.remove_by_id::<Task>(id)
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<Settings> {
    let mut settings = self.settings()?;
    patch.apply_to(&mut settings);
    self.store.set_settings(&settings)?;
    Ok(settings)
  }

  // ── Whole data set ────────────────────────────────────────────────────────

  /// Pretty-printed JSON snapshot of everything, stamped with `at`.
  pub fn export(&self, at: DateTime<Utc>) -> Result<String> { backup::export(&self.store, at) }

  /// Restore from an exported document. See [`backup::import`].
  pub fn import(&mut self, document: &str) -> Result<ImportSummary> {
    backup::import(&mut self.store, document)
  }

  /// Empty every collection and restore default settings.
  pub fn reset(&mut self) -> Result<()> {
    let mut batch = Batch::new();
    batch.put_collection::<Subject>(&[])?;
    batch.put_collection::<Schedule>(&[])?;
    batch.put_collection::<Task>(&[])?;
    batch.put_settings(&Settings::default())?;
    self.store.commit(batch)?;
    info!("all planner data reset");
    Ok(())
  }

  /// Copy data left behind by the multi-user layout. See
  /// [`migrate::migrate_legacy`].
  pub fn migrate_legacy(&mut self) -> Result<MigrationReport> {
    migrate::migrate_legacy(&mut self.store)
  }

  /// Copy the current user's data out of a dump of the old browser storage.
  /// See [`migrate::migrate_dump`].
  pub fn migrate_dump(&mut self, dump: &str) -> Result<MigrationReport> {
    migrate::migrate_dump(&mut self.store, dump)
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  fn require_subject(&self, id: &EntityId) -> Result<()> {
    match self.subject(id)? {
      Some(_) => Ok(()),
      None => Err(ValidationError::UnknownSubject(id.clone()).into()),
    }
  }

  fn remove_by_id<C: Collection>(&mut self, id: &EntityId) -> Result<Option<C>> {
    let mut items = self.store.get_all::<C>()?;
    let Some(index) = position(&items, id) else {
      return Ok(None);
    };
    let removed = items.remove(index);
    self.store.set_all(&items)?;
    debug!(%id, key = C::KEY, "entity deleted");
    Ok(Some(removed))
  }
}

fn position<C: Collection>(items: &[C], id: &EntityId) -> Option<usize> {
  items.iter().position(|item| item.id() == id)
}

fn name_taken(subjects: &[Subject], name: &str, exclude: Option<&EntityId>) -> bool {
  let needle = name.to_lowercase();
  subjects
    .iter()
    .any(|s| Some(&s.id) != exclude && s.name.to_lowercase() == needle)
}

fn checked_subject_name(
  subjects: &[Subject],
  name: &str,
  exclude: Option<&EntityId>,
) -> Result<String, ValidationError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(ValidationError::EmptySubjectName);
  }
  if name_taken(subjects, name, exclude) {
    return Err(ValidationError::DuplicateSubject(name.to_owned()));
  }
  Ok(name.to_owned())
}

fn checked_task_title(title: &str) -> Result<String, ValidationError> {
  let title = title.trim();
  if title.is_empty() {
    return Err(ValidationError::EmptyTaskTitle);
  }
  Ok(title.to_owned())
}
