//! Error types for `studyplan-core`.

use thiserror::Error;

use crate::{
  id::EntityId,
  schedule::{ClockTime, Day},
};

#[derive(Debug, Error)]
pub enum Error {
  /// The requested mutation breaks a data-model rule; nothing was written.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("import document is not valid: {0}")]
  Import(#[source] serde_json::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage medium error: {0}")]
  Medium(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn medium<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Medium(Box::new(err))
  }
}

/// A rejected create or update, with a reason fit for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("please enter a subject name")]
  EmptySubjectName,

  #[error("a subject named {0:?} already exists")]
  DuplicateSubject(String),

  #[error("please enter a task title")]
  EmptyTaskTitle,

  #[error("subject not found: {0}")]
  UnknownSubject(EntityId),

  #[error("end time {end} must be after start time {start}")]
  InvalidTimeRange { start: ClockTime, end: ClockTime },

  #[error(
    "time slot conflicts with the existing {day} slot {existing_start}-{existing_end}"
  )]
  ScheduleConflict {
    day:            Day,
    existing:       EntityId,
    existing_start: ClockTime,
    existing_end:   ClockTime,
  },

  #[error("invalid clock time {0:?}, expected HH:MM")]
  InvalidClockTime(String),

  #[error("invalid deadline {0:?}, expected an RFC 3339 or YYYY-MM-DDTHH:MM timestamp")]
  InvalidDeadline(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
