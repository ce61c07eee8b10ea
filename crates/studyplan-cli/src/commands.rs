//! Subcommand definitions and dispatch onto the [`Planner`].

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Context as _, anyhow, bail};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Subcommand};
use studyplan_core::{
  EntityId, Planner,
  backup::backup_file_name,
  medium::Medium,
  schedule::{ClockTime, Day, NewSchedule, SchedulePatch},
  settings::{SettingsPatch, Theme},
  stats,
  store::Collection,
  subject::{Color, NewSubject, Priority, Subject, SubjectPatch},
  task::{NewTask, TaskKind, TaskPatch, parse_deadline},
};

use crate::render::{self, Names};

// ─── Command tree ────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Manage subjects.
  #[command(subcommand)]
  Subject(SubjectCommand),

  /// Manage weekly time slots.
  #[command(subcommand)]
  Schedule(ScheduleCommand),

  /// Manage tasks and deadlines.
  #[command(subcommand)]
  Task(TaskCommand),

  /// Write all data as a JSON backup.
  Export {
    /// Output file, or a directory to place a timestamped backup in.
    /// Prints to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,
  },

  /// Restore data from a JSON backup. Collections present in the file
  /// replace the current ones.
  Import { file: PathBuf },

  /// Erase every subject, schedule and task and restore default settings.
  Reset {
    /// Confirm the erase.
    #[arg(long)]
    yes: bool,
  },

  /// Dashboard, per-subject progress and insights.
  Stats,

  /// Show the colour theme, or set it.
  Theme { theme: Option<Theme> },

  /// Copy the current user's data from the old multi-user layout. Collections
  /// that already exist are never overwritten.
  Migrate {
    /// Dump of the old browser storage: a JSON object mapping storage keys
    /// (`currentUser`, `userData`) to their values. Without it, legacy keys
    /// already in the store are used.
    #[arg(long, value_name = "FILE")]
    from: Option<PathBuf>,
  },
}

#[derive(Subcommand, Debug)]
pub enum SubjectCommand {
  Add {
    name:     String,
    #[arg(short, long, default_value_t = Priority::Medium)]
    priority: Priority,
  },
  List,
  Edit {
    /// Subject id (or prefix) or name.
    subject:  String,
    #[arg(long)]
    name:     Option<String>,
    #[arg(short, long)]
    priority: Option<Priority>,
    #[arg(long)]
    color:    Option<String>,
  },
  /// Delete a subject with all of its schedules and tasks.
  Delete { subject: String },
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
  Add {
    /// Subject id (or prefix) or name.
    subject: String,
    day:     Day,
    start:   ClockTime,
    end:     ClockTime,
    #[arg(long)]
    note:    Option<String>,
  },
  List {
    #[arg(short, long)]
    day: Option<Day>,
  },
  Edit {
    id: String,
    #[command(flatten)]
    fields: ScheduleFields,
  },
  Delete { id: String },
  /// Today's slots in start order.
  Today,
}

#[derive(Args, Debug)]
pub struct ScheduleFields {
  #[arg(long)]
  subject: Option<String>,
  #[arg(long)]
  day:     Option<Day>,
  #[arg(long)]
  start:   Option<ClockTime>,
  #[arg(long)]
  end:     Option<ClockTime>,
  #[arg(long)]
  note:    Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
  Add {
    /// Subject id (or prefix) or name.
    subject:  String,
    title:    String,
    /// RFC 3339, or `YYYY-MM-DDTHH:MM` in local time.
    #[arg(short, long, value_parser = parse_deadline)]
    deadline: DateTime<Utc>,
    #[arg(short, long, default_value = "assignment")]
    kind:     TaskKind,
  },
  List {
    #[arg(short, long)]
    subject: Option<String>,
    /// Only incomplete tasks.
    #[arg(long)]
    pending: bool,
  },
  /// Flip a task between done and not done.
  Toggle { id: String },
  Edit {
    id: String,
    #[arg(long)]
    subject:  Option<String>,
    #[arg(long)]
    title:    Option<String>,
    #[arg(short, long)]
    kind:     Option<TaskKind>,
    #[arg(short, long, value_parser = parse_deadline)]
    deadline: Option<DateTime<Utc>>,
  },
  Delete { id: String },
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

pub fn run<M: Medium>(
  planner: &mut Planner<M>,
  command: Command,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  match command {
    Command::Subject(cmd) => subject(planner, cmd, out),
    Command::Schedule(cmd) => schedule(planner, cmd, out),
    Command::Task(cmd) => task(planner, cmd, out),
    Command::Export { out: path } => {
      let now = Utc::now();
      let document = planner.export(now)?;
      match path {
        None => writeln!(out, "{document}")?,
        Some(path) => {
          let path = if path.is_dir() { path.join(backup_file_name(now)) } else { path };
          fs::write(&path, document)
            .with_context(|| format!("failed to write {}", path.display()))?;
          writeln!(out, "exported to {}", path.display())?;
        }
      }
      Ok(())
    }
    Command::Import { file } => {
      let document = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
      let summary = planner.import(&document)?;
      render::import_summary(out, &summary)?;
      Ok(())
    }
    Command::Reset { yes } => {
      if !yes {
        bail!("refusing to erase all data without --yes");
      }
      planner.reset()?;
      writeln!(out, "all data erased")?;
      Ok(())
    }
    Command::Stats => show_stats(planner, out),
    Command::Theme { theme } => {
      let settings = match theme {
        Some(theme) => planner.update_settings(SettingsPatch { theme: Some(theme) })?,
        None => planner.settings()?,
      };
      writeln!(out, "{}", settings.theme)?;
      Ok(())
    }
    Command::Migrate { from } => {
      let report = match from {
        Some(file) => {
          let dump = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
          planner.migrate_dump(&dump)?
        }
        None => planner.migrate_legacy()?,
      };
      match (&report.user, report.is_noop()) {
        (Some(user), false) => {
          writeln!(out, "migrated {} for {user}", report.copied.join(", "))?
        }
        _ => writeln!(out, "nothing to migrate")?,
      }
      Ok(())
    }
  }
}

fn subject<M: Medium>(
  planner: &mut Planner<M>,
  cmd: SubjectCommand,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  match cmd {
    SubjectCommand::Add { name, priority } => {
      let subject = planner.add_subject(NewSubject::new(name, priority))?;
      render::subject(out, &subject)?;
    }
    SubjectCommand::List => {
      for subject in planner.subjects()? {
        render::subject(out, &subject)?;
      }
    }
    SubjectCommand::Edit { subject, name, priority, color } => {
      let target = resolve_subject(planner, &subject)?;
      let patch = SubjectPatch { name, priority, color: color.as_deref().map(Color::from) };
      let updated = planner
        .update_subject(&target.id, patch)?
        .ok_or_else(|| anyhow!("subject {} no longer exists", target.id))?;
      render::subject(out, &updated)?;
    }
    SubjectCommand::Delete { subject } => {
      let target = resolve_subject(planner, &subject)?;
      let removed = planner
        .delete_subject(&target.id)?
        .ok_or_else(|| anyhow!("subject {} no longer exists", target.id))?;
      writeln!(
        out,
        "deleted {} ({} schedules, {} tasks)",
        removed.subject.name, removed.schedules, removed.tasks
      )?;
    }
  }
  Ok(())
}

fn schedule<M: Medium>(
  planner: &mut Planner<M>,
  cmd: ScheduleCommand,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  match cmd {
    ScheduleCommand::Add { subject, day, start, end, note } => {
      let subject_id = resolve_subject(planner, &subject)?.id;
      let slot = planner.add_schedule(NewSchedule {
        subject_id,
        day,
        start_time: start,
        end_time: end,
        note,
      })?;
      let subjects = planner.subjects()?;
      render::schedule(out, &slot, &Names::new(&subjects))?;
    }
    ScheduleCommand::List { day } => {
      let subjects = planner.subjects()?;
      let names = Names::new(&subjects);
      let mut slots = planner.schedules()?;
      slots.retain(|s| day.is_none_or(|d| s.day == d));
      slots.sort_by_key(|s| (s.day, s.start_time));
      for slot in &slots {
        render::schedule(out, slot, &names)?;
      }
    }
    ScheduleCommand::Edit { id, fields } => {
      let id = resolve_id(&planner.schedules()?, &id)?;
      let subject_id = match &fields.subject {
        Some(key) => Some(resolve_subject(planner, key)?.id),
        None => None,
      };
      let patch = SchedulePatch {
        subject_id,
        day: fields.day,
        start_time: fields.start,
        end_time: fields.end,
        note: fields.note,
      };
      let slot = planner
        .update_schedule(&id, patch)?
        .ok_or_else(|| anyhow!("schedule {id} no longer exists"))?;
      let subjects = planner.subjects()?;
      render::schedule(out, &slot, &Names::new(&subjects))?;
    }
    ScheduleCommand::Delete { id } => {
      let id = resolve_id(&planner.schedules()?, &id)?;
      planner
        .delete_schedule(&id)?
        .ok_or_else(|| anyhow!("schedule {id} no longer exists"))?;
      writeln!(out, "deleted schedule {}", render::short_id(&id))?;
    }
    ScheduleCommand::Today => {
      let today = Day::of(Local::now());
      let subjects = planner.subjects()?;
      let names = Names::new(&subjects);
      let slots = planner.schedules()?;
      let agenda = stats::agenda(&slots, today);
      if agenda.is_empty() {
        writeln!(out, "nothing scheduled for {today}")?;
      }
      for slot in agenda {
        render::schedule(out, slot, &names)?;
      }
    }
  }
  Ok(())
}

fn task<M: Medium>(
  planner: &mut Planner<M>,
  cmd: TaskCommand,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  let now = Utc::now();
  match cmd {
    TaskCommand::Add { subject, title, deadline, kind } => {
      let subject_id = resolve_subject(planner, &subject)?.id;
      let task = planner.add_task(NewTask { subject_id, title, kind, deadline })?;
      let subjects = planner.subjects()?;
      render::task(out, &task, &Names::new(&subjects), now)?;
    }
    TaskCommand::List { subject, pending } => {
      let subjects = planner.subjects()?;
      let names = Names::new(&subjects);
      let mut tasks = match &subject {
        Some(key) => planner.tasks_for_subject(&resolve_subject(planner, key)?.id)?,
        None => planner.tasks()?,
      };
      if pending {
        tasks.retain(|t| !t.completed);
      }
      tasks.sort_by_key(|t| t.deadline);
      for task in &tasks {
        render::task(out, task, &names, now)?;
      }
    }
    TaskCommand::Toggle { id } => {
      let id = resolve_id(&planner.tasks()?, &id)?;
      let task = planner
        .toggle_task(&id)?
        .ok_or_else(|| anyhow!("task {id} no longer exists"))?;
      let subjects = planner.subjects()?;
      render::task(out, &task, &Names::new(&subjects), now)?;
    }
    TaskCommand::Edit { id, subject, title, kind, deadline } => {
      let id = resolve_id(&planner.tasks()?, &id)?;
      let subject_id = match &subject {
        Some(key) => Some(resolve_subject(planner, key)?.id),
        None => None,
      };
      let patch = TaskPatch { subject_id, title, kind, deadline, completed: None };
      let task = planner
        .update_task(&id, patch)?
        .ok_or_else(|| anyhow!("task {id} no longer exists"))?;
      let subjects = planner.subjects()?;
      render::task(out, &task, &Names::new(&subjects), now)?;
    }
    TaskCommand::Delete { id } => {
      let id = resolve_id(&planner.tasks()?, &id)?;
      planner
        .delete_task(&id)?
        .ok_or_else(|| anyhow!("task {id} no longer exists"))?;
      writeln!(out, "deleted task {}", render::short_id(&id))?;
    }
  }
  Ok(())
}

fn show_stats<M: Medium>(planner: &Planner<M>, out: &mut impl Write) -> anyhow::Result<()> {
  let now = Utc::now();
  let subjects = planner.subjects()?;
  let schedules = planner.schedules()?;
  let tasks = planner.tasks()?;
  let names = Names::new(&subjects);

  render::dashboard(out, &stats::dashboard(&subjects, &tasks))?;

  let upcoming = stats::upcoming_deadlines(&tasks, now);
  if !upcoming.is_empty() {
    writeln!(out, "\nUpcoming deadlines:")?;
    for task in upcoming {
      render::task(out, task, &names, now)?;
    }
  }

  render::progress(out, &stats::subject_progress(&subjects, &tasks))?;
  render::insights(out, &stats::insights(&subjects, &schedules, &tasks, now))?;
  Ok(())
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Find a subject by exact id, unique id prefix, or case-insensitive name.
fn resolve_subject<M: Medium>(planner: &Planner<M>, key: &str) -> anyhow::Result<Subject> {
  let subjects = planner.subjects()?;
  let wanted = key.trim().to_lowercase();
  if let Some(subject) = subjects.iter().find(|s| s.name.trim().to_lowercase() == wanted) {
    return Ok(subject.clone());
  }
  let id = resolve_id(&subjects, key).map_err(|_| anyhow!("no subject matches {key:?}"))?;
  subjects
    .into_iter()
    .find(|s| s.id == id)
    .ok_or_else(|| anyhow!("no subject matches {key:?}"))
}

/// Match `key` against ids in `items`: an exact id wins, otherwise the
/// prefix must pick out exactly one item.
fn resolve_id<T: Collection>(items: &[T], key: &str) -> anyhow::Result<EntityId> {
  if let Some(item) = items.iter().find(|i| i.id().as_str() == key) {
    return Ok(item.id().clone());
  }
  let mut matches = items.iter().filter(|i| !key.is_empty() && i.id().as_str().starts_with(key));
  match (matches.next(), matches.next()) {
    (Some(item), None) => Ok(item.id().clone()),
    (Some(_), Some(_)) => bail!("{} id prefix {key:?} is ambiguous", T::KEY),
    (None, _) => bail!("no entry in {} matches {key:?}", T::KEY),
  }
}
