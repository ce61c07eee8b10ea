//! Derived views for dashboards and analytics.
//!
//! Everything here is a pure function over query snapshots; callers pass the
//! current time explicitly.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::{
  schedule::{Day, Schedule},
  subject::Subject,
  task::Task,
};

/// How far ahead a deadline counts as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;
/// How many upcoming deadlines the dashboard lists.
pub const UPCOMING_LIMIT: usize = 5;

/// Percentage of `completed` out of `total`, rounded; 0 when `total` is 0.
pub fn completion_rate(completed: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  (completed as f64 / total as f64 * 100.0).round() as u8
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dashboard {
  pub total_subjects:  usize,
  pub completed_tasks: usize,
  pub pending_tasks:   usize,
  pub completion_rate: u8,
}

pub fn dashboard(subjects: &[Subject], tasks: &[Task]) -> Dashboard {
  let completed = tasks.iter().filter(|t| t.completed).count();
  Dashboard {
    total_subjects:  subjects.len(),
    completed_tasks: completed,
    pending_tasks:   tasks.len() - completed,
    completion_rate: completion_rate(completed, tasks.len()),
  }
}

/// Incomplete tasks due between `now` and seven days later, earliest first,
/// at most [`UPCOMING_LIMIT`].
pub fn upcoming_deadlines(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
  let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
  let mut upcoming: Vec<&Task> = tasks
    .iter()
    .filter(|t| !t.completed && t.deadline >= now && t.deadline <= horizon)
    .collect();
  upcoming.sort_by_key(|t| t.deadline);
  upcoming.truncate(UPCOMING_LIMIT);
  upcoming
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
  Overdue,
  /// Due within 24 hours.
  DueSoon,
  Upcoming,
}

/// Urgency of an incomplete task; completed tasks have none.
pub fn deadline_status(task: &Task, now: DateTime<Utc>) -> Option<DeadlineStatus> {
  if task.completed {
    return None;
  }
  let left = task.deadline - now;
  Some(if left < Duration::zero() {
    DeadlineStatus::Overdue
  } else if left < Duration::hours(24) {
    DeadlineStatus::DueSoon
  } else {
    DeadlineStatus::Upcoming
  })
}

/// Slots on `day`, earliest start first.
pub fn agenda(schedules: &[Schedule], day: Day) -> Vec<&Schedule> {
  let mut slots: Vec<&Schedule> = schedules.iter().filter(|s| s.day == day).collect();
  slots.sort_by_key(|s| s.start_time);
  slots
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectProgress<'a> {
  pub subject:   &'a Subject,
  pub completed: usize,
  pub total:     usize,
  pub percent:   u8,
}

/// Completion per subject, for subjects that have tasks, best first.
pub fn subject_progress<'a>(subjects: &'a [Subject], tasks: &[Task]) -> Vec<SubjectProgress<'a>> {
  let mut progress: Vec<SubjectProgress<'a>> = subjects
    .iter()
    .map(|subject| {
      let (completed, total) = tally(tasks, subject);
      SubjectProgress { subject, completed, total, percent: completion_rate(completed, total) }
    })
    .filter(|p| p.total > 0)
    .collect();
  progress.sort_by(|a, b| b.percent.cmp(&a.percent));
  progress
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insight {
  MostProductive { subject: String, completed: usize },
  NeedsAttention { subject: String, pending: usize },
  MostScheduled { subject: String, slots: usize },
  DueThisWeek { count: usize },
  OverallProgress { percent: u8 },
}

impl Insight {
  pub fn title(&self) -> &'static str {
    match self {
      Self::MostProductive { .. } => "Most productive subject",
      Self::NeedsAttention { .. } => "Needs attention",
      Self::MostScheduled { .. } => "Most scheduled",
      Self::DueThisWeek { .. } => "Upcoming this week",
      Self::OverallProgress { .. } => "Overall progress",
    }
  }
}

impl fmt::Display for Insight {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MostProductive { subject, completed } => {
        write!(f, "{subject} with {completed} completed tasks")
      }
      Self::NeedsAttention { subject, pending } => {
        write!(f, "{subject} has {pending} pending tasks")
      }
      Self::MostScheduled { subject, slots } => {
        write!(f, "{subject} with {slots} time slots per week")
      }
      Self::DueThisWeek { count } => {
        let plural = if *count == 1 { "" } else { "s" };
        write!(f, "{count} task{plural} due within 7 days")
      }
      Self::OverallProgress { percent } => {
        write!(f, "{percent}% completion rate across all subjects")
      }
    }
  }
}

/// Headline observations about the data set. Empty until there is at least
/// one subject and one task.
pub fn insights(
  subjects: &[Subject],
  schedules: &[Schedule],
  tasks: &[Task],
  now: DateTime<Utc>,
) -> Vec<Insight> {
  if subjects.is_empty() || tasks.is_empty() {
    return Vec::new();
  }
  let mut insights = Vec::new();

  // (subject, completed, total), most completed first.
  let mut by_completed: Vec<(&Subject, usize, usize)> = subjects
    .iter()
    .map(|s| {
      let (completed, total) = tally(tasks, s);
      (s, completed, total)
    })
    .collect();
  by_completed.sort_by(|a, b| b.1.cmp(&a.1));

  if let Some(&(subject, completed, _)) = by_completed.first()
    && completed > 0
  {
    insights.push(Insight::MostProductive { subject: subject.name.clone(), completed });
  }

  if let Some(&(subject, completed, total)) = by_completed
    .iter()
    .find(|(_, completed, total)| *total > 0 && (*completed as f64 / *total as f64) < 0.5)
  {
    insights.push(Insight::NeedsAttention { subject: subject.name.clone(), pending: total - completed });
  }

  let mut by_slots: Vec<(&Subject, usize)> = subjects
    .iter()
    .map(|s| (s, schedules.iter().filter(|slot| slot.subject_id == s.id).count()))
    .collect();
  by_slots.sort_by(|a, b| b.1.cmp(&a.1));
  if let Some(&(subject, slots)) = by_slots.first()
    && slots > 0
  {
    insights.push(Insight::MostScheduled { subject: subject.name.clone(), slots });
  }

  let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
  let due = tasks
    .iter()
    .filter(|t| !t.completed && t.deadline >= now && t.deadline <= horizon)
    .count();
  if due > 0 {
    insights.push(Insight::DueThisWeek { count: due });
  }

  let completed = tasks.iter().filter(|t| t.completed).count();
  insights.push(Insight::OverallProgress { percent: completion_rate(completed, tasks.len()) });
  insights
}

fn tally(tasks: &[Task], subject: &Subject) -> (usize, usize) {
  tasks
    .iter()
    .filter(|t| t.subject_id == subject.id)
    .fold((0, 0), |(done, total), t| (done + usize::from(t.completed), total + 1))
}
