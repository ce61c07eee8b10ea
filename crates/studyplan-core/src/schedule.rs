//! Schedule: a recurring weekly time slot bound to a subject.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  error::ValidationError,
  id::EntityId,
  store::{Collection, keys},
};

// ─── Day ─────────────────────────────────────────────────────────────────────

/// Day of the week, Sunday first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Day {
  Sunday,
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
}

impl Day {
  /// The weekday a calendar date falls on.
  pub fn of(date: impl Datelike) -> Self {
    match date.weekday() {
      Weekday::Sun => Self::Sunday,
      Weekday::Mon => Self::Monday,
      Weekday::Tue => Self::Tuesday,
      Weekday::Wed => Self::Wednesday,
      Weekday::Thu => Self::Thursday,
      Weekday::Fri => Self::Friday,
      Weekday::Sat => Self::Saturday,
    }
  }
}

// ─── ClockTime ───────────────────────────────────────────────────────────────

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time with minute precision, stored as minutes since midnight.
///
/// Parsed from `H:MM` or `HH:MM` and always written back as zero-padded
/// `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
  pub fn new(hours: u8, minutes: u8) -> Option<Self> {
    (hours < 24 && minutes < 60).then(|| Self(u16::from(hours) * 60 + u16::from(minutes)))
  }

  pub fn from_minutes(minutes: u16) -> Option<Self> {
    (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
  }

  /// Minutes since midnight.
  pub fn minutes(self) -> u16 { self.0 }

  pub fn hour(self) -> u8 { (self.0 / 60) as u8 }

  pub fn minute(self) -> u8 { (self.0 % 60) as u8 }

  /// 12-hour rendering, e.g. `9:05 AM`, `12:30 PM`.
  pub fn to_12_hour(self) -> String {
    let period = if self.hour() >= 12 { "PM" } else { "AM" };
    let hour = match self.hour() {
      0 => 12,
      h if h > 12 => h - 12,
      h => h,
    };
    format!("{hour}:{:02} {period}", self.minute())
  }
}

impl fmt::Display for ClockTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour(), self.minute())
  }
}

impl FromStr for ClockTime {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || ValidationError::InvalidClockTime(s.to_owned());
    let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;

    let well_formed = (1..=2).contains(&hours.len())
      && minutes.len() == 2
      && hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit());
    if !well_formed {
      return Err(invalid());
    }

    let hours: u8 = hours.parse().map_err(|_| invalid())?;
    let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
    Self::new(hours, minutes).ok_or_else(invalid)
  }
}

impl Serialize for ClockTime {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for ClockTime {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(de::Error::custom)
  }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
  pub id:         EntityId,
  pub subject_id: EntityId,
  pub day:        Day,
  pub start_time: ClockTime,
  pub end_time:   ClockTime,
  #[serde(default)]
  pub note:       String,
  pub created_at: DateTime<Utc>,
}

impl Collection for Schedule {
  const KEY: &'static str = keys::SCHEDULES;

  fn id(&self) -> &EntityId { &self.id }
}

/// Input to [`crate::Planner::add_schedule`].
#[derive(Debug, Clone)]
pub struct NewSchedule {
  pub subject_id: EntityId,
  pub day:        Day,
  pub start_time: ClockTime,
  pub end_time:   ClockTime,
  pub note:       Option<String>,
}

/// Partial update for a schedule; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
  pub subject_id: Option<EntityId>,
  pub day:        Option<Day>,
  pub start_time: Option<ClockTime>,
  pub end_time:   Option<ClockTime>,
  pub note:       Option<String>,
}

impl SchedulePatch {
  pub fn apply_to(self, schedule: &mut Schedule) {
    if let Some(subject_id) = self.subject_id {
      schedule.subject_id = subject_id;
    }
    if let Some(day) = self.day {
      schedule.day = day;
    }
    if let Some(start_time) = self.start_time {
      schedule.start_time = start_time;
    }
    if let Some(end_time) = self.end_time {
      schedule.end_time = end_time;
    }
    if let Some(note) = self.note {
      schedule.note = note;
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use strum::IntoEnumIterator;

  use super::*;

  fn t(s: &str) -> ClockTime { s.parse().unwrap() }

  #[test]
  fn clock_time_parses_and_pads() {
    assert_eq!(t("09:30").minutes(), 570);
    assert_eq!(t("9:30"), t("09:30"));
    assert_eq!(t("9:05").to_string(), "09:05");
    assert_eq!(t("23:59").minutes(), 1439);
    assert_eq!(t("00:00").minutes(), 0);
  }

  #[test]
  fn clock_time_rejects_garbage() {
    for bad in ["24:00", "12:60", "12", "1:5", "ab:cd", "+1:00", "123:00", ""] {
      assert!(bad.parse::<ClockTime>().is_err(), "{bad:?} should not parse");
    }
  }

  #[test]
  fn clock_time_twelve_hour_rendering() {
    assert_eq!(t("00:15").to_12_hour(), "12:15 AM");
    assert_eq!(t("09:00").to_12_hour(), "9:00 AM");
    assert_eq!(t("12:30").to_12_hour(), "12:30 PM");
    assert_eq!(t("18:45").to_12_hour(), "6:45 PM");
  }

  #[test]
  fn day_wire_form_is_lowercase() {
    assert_eq!(serde_json::to_string(&Day::Wednesday).unwrap(), "\"wednesday\"");
    assert_eq!("Monday".parse::<Day>().unwrap(), Day::Monday);
    assert_eq!(Day::iter().count(), 7);
    assert_eq!(Day::iter().next(), Some(Day::Sunday));
  }

  #[test]
  fn day_of_calendar_date() {
    // 2024-09-02 was a Monday.
    let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    assert_eq!(Day::of(date), Day::Monday);
  }

  #[test]
  fn schedule_uses_camel_case_fields_and_defaults_note() {
    let json = r#"{
      "id": "s1",
      "subjectId": "math",
      "day": "friday",
      "startTime": "08:00",
      "endTime": "09:15",
      "createdAt": "2024-09-01T10:00:00Z"
    }"#;
    let schedule: Schedule = serde_json::from_str(json).unwrap();
    assert_eq!(schedule.subject_id.as_str(), "math");
    assert_eq!(schedule.end_time, t("09:15"));
    assert!(schedule.note.is_empty());

    let back = serde_json::to_value(&schedule).unwrap();
    assert_eq!(back["startTime"], "08:00");
  }

  #[test]
  fn patch_only_touches_provided_fields() {
    let mut schedule = Schedule {
      id:         "s1".into(),
      subject_id: "math".into(),
      day:        Day::Monday,
      start_time: t("09:00"),
      end_time:   t("10:00"),
      note:       "room 4".into(),
      created_at: Utc::now(),
    };
    SchedulePatch { end_time: Some(t("10:30")), ..Default::default() }.apply_to(&mut schedule);
    assert_eq!(schedule.end_time, t("10:30"));
    assert_eq!(schedule.start_time, t("09:00"));
    assert_eq!(schedule.note, "room 4");
  }
}
