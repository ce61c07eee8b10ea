//! Plain-text rendering of planner data for the terminal.

use std::{collections::HashMap, io::Write};

use chrono::{DateTime, Local, Utc};
use studyplan_core::{
  EntityId,
  backup::ImportSummary,
  schedule::Schedule,
  stats::{self, DeadlineStatus, Dashboard, Insight, SubjectProgress},
  subject::Subject,
  task::Task,
};

/// Ids are shown truncated; any unique prefix is accepted back as input.
const SHORT_ID: usize = 8;

pub fn short_id(id: &EntityId) -> &str {
  let s = id.as_str();
  s.get(..SHORT_ID).unwrap_or(s)
}

/// Subject names by id, for labelling schedules and tasks.
pub struct Names<'a>(HashMap<&'a EntityId, &'a str>);

impl<'a> Names<'a> {
  pub fn new(subjects: &'a [Subject]) -> Self {
    Self(subjects.iter().map(|s| (&s.id, s.name.as_str())).collect())
  }

  pub fn of(&self, id: &EntityId) -> &'a str { self.0.get(id).copied().unwrap_or("?") }
}

// ─── Entities ────────────────────────────────────────────────────────────────

pub fn subject(out: &mut impl Write, subject: &Subject) -> std::io::Result<()> {
  writeln!(
    out,
    "{}  {:<24} {:<6} {}",
    short_id(&subject.id),
    subject.name,
    subject.priority,
    subject.color
  )
}

pub fn schedule(out: &mut impl Write, slot: &Schedule, names: &Names<'_>) -> std::io::Result<()> {
  write!(
    out,
    "{}  {:<9} {:>8} - {:<8}  {}",
    short_id(&slot.id),
    slot.day,
    slot.start_time.to_12_hour(),
    slot.end_time.to_12_hour(),
    names.of(&slot.subject_id)
  )?;
  if !slot.note.is_empty() {
    write!(out, "  ({})", slot.note)?;
  }
  writeln!(out)
}

pub fn task(
  out: &mut impl Write,
  task: &Task,
  names: &Names<'_>,
  now: DateTime<Utc>,
) -> std::io::Result<()> {
  let mark = if task.completed { 'x' } else { ' ' };
  write!(
    out,
    "[{mark}] {}  {}  ({}, {})  due {}",
    short_id(&task.id),
    task.title,
    task.kind,
    names.of(&task.subject_id),
    task.deadline.with_timezone(&Local).format("%Y-%m-%d %H:%M")
  )?;
  match stats::deadline_status(task, now) {
    Some(DeadlineStatus::Overdue) => writeln!(out, "  OVERDUE"),
    Some(DeadlineStatus::DueSoon) => writeln!(out, "  due soon"),
    Some(DeadlineStatus::Upcoming) | None => writeln!(out),
  }
}

pub fn import_summary(out: &mut impl Write, summary: &ImportSummary) -> std::io::Result<()> {
  let mut parts = Vec::new();
  for (label, count) in [
    ("subjects", summary.subjects),
    ("schedules", summary.schedules),
    ("tasks", summary.tasks),
  ] {
    if let Some(count) = count {
      parts.push(format!("{count} {label}"));
    }
  }
  if summary.settings {
    parts.push("settings".to_owned());
  }
  if parts.is_empty() {
    writeln!(out, "nothing to import")
  } else {
    writeln!(out, "imported {}", parts.join(", "))
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

pub fn dashboard(out: &mut impl Write, d: &Dashboard) -> std::io::Result<()> {
  writeln!(
    out,
    "Subjects: {}  Completed: {}  Pending: {}  Completion: {}%",
    d.total_subjects, d.completed_tasks, d.pending_tasks, d.completion_rate
  )
}

pub fn progress(out: &mut impl Write, rows: &[SubjectProgress<'_>]) -> std::io::Result<()> {
  if rows.is_empty() {
    return Ok(());
  }
  writeln!(out, "\nProgress by subject:")?;
  for row in rows {
    writeln!(
      out,
      "  {:<24} {}/{} ({}%)",
      row.subject.name, row.completed, row.total, row.percent
    )?;
  }
  Ok(())
}

pub fn insights(out: &mut impl Write, insights: &[Insight]) -> std::io::Result<()> {
  if insights.is_empty() {
    return Ok(());
  }
  writeln!(out, "\nInsights:")?;
  for insight in insights {
    writeln!(out, "  {}: {insight}", insight.title())?;
  }
  Ok(())
}
