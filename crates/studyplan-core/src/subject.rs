//! Subject: a course or topic that owns schedules and tasks.
//!
//! Schedules and tasks refer to their subject by id. Removing a subject
//! removes everything that refers to it; see [`crate::Planner::delete_subject`].

use std::fmt;

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  id::EntityId,
  store::{Collection, keys},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// The display colours a new subject can be given.
pub const PALETTE: [&str; 8] = [
  "#10b981", "#3b82f6", "#8b5cf6", "#ec4899", "#f59e0b", "#ef4444", "#14b8a6", "#6366f1",
];

/// A display colour as a `#rrggbb` string.
///
/// New subjects draw from [`PALETTE`]; stored values are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
  pub fn random() -> Self {
    let index = OsRng.next_u32() as usize % PALETTE.len();
    Self(PALETTE[index].to_owned())
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Color {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub id:         EntityId,
  /// Unique among subjects, compared case-insensitively.
  pub name:       String,
  pub priority:   Priority,
  pub color:      Color,
  pub created_at: DateTime<Utc>,
}

impl Collection for Subject {
  const KEY: &'static str = keys::SUBJECTS;

  fn id(&self) -> &EntityId { &self.id }
}

/// Input to [`crate::Planner::add_subject`]. Colour and timestamps are
/// assigned by the planner.
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub name:     String,
  pub priority: Priority,
}

impl NewSubject {
  pub fn new(name: impl Into<String>, priority: Priority) -> Self {
    Self { name: name.into(), priority }
  }
}

/// Partial update for a subject; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
  pub name:     Option<String>,
  pub priority: Option<Priority>,
  pub color:    Option<Color>,
}

impl SubjectPatch {
  pub fn apply_to(self, subject: &mut Subject) {
    if let Some(name) = self.name {
      subject.name = name;
    }
    if let Some(priority) = self.priority {
      subject.priority = priority;
    }
    if let Some(color) = self.color {
      subject.color = color;
    }
  }
}
