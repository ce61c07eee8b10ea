//! Task: a deadline-bound unit of work bound to a subject.

use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, Duration, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
  error::ValidationError,
  id::EntityId,
  store::{Collection, keys},
};

// ─── TaskKind ────────────────────────────────────────────────────────────────

/// What sort of work a task is. Unknown labels are kept as
/// [`TaskKind::Custom`] so the set can grow without a data migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskKind {
  #[default]
  Assignment,
  Exam,
  Reading,
  Other,
  Custom(String),
}

impl TaskKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Assignment => "assignment",
      Self::Exam => "exam",
      Self::Reading => "reading",
      Self::Other => "other",
      Self::Custom(label) => label,
    }
  }
}

impl From<String> for TaskKind {
  fn from(value: String) -> Self {
    match value.to_ascii_lowercase().as_str() {
      "assignment" => Self::Assignment,
      "exam" => Self::Exam,
      "reading" => Self::Reading,
      "other" => Self::Other,
      _ => Self::Custom(value),
    }
  }
}

impl From<TaskKind> for String {
  fn from(value: TaskKind) -> Self {
    match value {
      TaskKind::Custom(label) => label,
      known => known.as_str().to_owned(),
    }
  }
}

impl FromStr for TaskKind {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self::from(s.to_owned())) }
}

impl fmt::Display for TaskKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Deadline encoding ───────────────────────────────────────────────────────

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a deadline from RFC 3339, or from the zone-less `YYYY-MM-DDTHH:MM`
/// form (seconds optional) which is read as local time.
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
  parse_deadline_in(raw, &Local)
}

/// [`parse_deadline`] with zone-less input read in `tz`.
///
/// A wall-clock time skipped by a DST transition rolls forward an hour; an
/// ambiguous one resolves to the earlier instant.
pub fn parse_deadline_in<Tz: TimeZone>(
  raw: &str,
  tz: &Tz,
) -> Result<DateTime<Utc>, ValidationError> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  NAIVE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .and_then(|naive| {
      tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
    })
    .map(|dt| dt.with_timezone(&Utc))
    .ok_or_else(|| ValidationError::InvalidDeadline(raw.to_owned()))
}

mod deadline {
  use super::*;

  pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_deadline(&raw).map_err(de::Error::custom)
  }
}

// ─── Task ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:         EntityId,
  pub subject_id: EntityId,
  pub title:      String,
  #[serde(rename = "type")]
  pub kind:       TaskKind,
  #[serde(with = "deadline")]
  pub deadline:   DateTime<Utc>,
  #[serde(default)]
  pub completed:  bool,
  pub created_at: DateTime<Utc>,
}

impl Collection for Task {
  const KEY: &'static str = keys::TASKS;

  fn id(&self) -> &EntityId { &self.id }
}

/// Input to [`crate::Planner::add_task`]. New tasks always start incomplete.
#[derive(Debug, Clone)]
pub struct NewTask {
  pub subject_id: EntityId,
  pub title:      String,
  pub kind:       TaskKind,
  pub deadline:   DateTime<Utc>,
}

/// Partial update for a task; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
  pub subject_id: Option<EntityId>,
  pub title:      Option<String>,
  pub kind:       Option<TaskKind>,
  pub deadline:   Option<DateTime<Utc>>,
  pub completed:  Option<bool>,
}

impl TaskPatch {
  pub fn apply_to(self, task: &mut Task) {
    if let Some(subject_id) = self.subject_id {
      task.subject_id = subject_id;
    }
    if let Some(title) = self.title {
      task.title = title;
    }
    if let Some(kind) = self.kind {
      task.kind = kind;
    }
    if let Some(deadline) = self.deadline {
      task.deadline = deadline;
    }
    if let Some(completed) = self.completed {
      task.completed = completed;
    }
  }
}
