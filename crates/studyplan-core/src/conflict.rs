//! Schedule conflict detection.
//!
//! Slots are half-open intervals `[start, end)` in minutes since midnight.
//! Two slots on the same day conflict iff `s1 < e2 && s2 < e1`, so slots
//! that merely touch (`e1 == s2`) do not conflict.

use crate::{
  error::ValidationError,
  id::EntityId,
  schedule::{ClockTime, Day, Schedule},
};

/// Whether `[a_start, a_end)` and `[b_start, b_end)` overlap.
pub fn intervals_overlap(
  a_start: ClockTime,
  a_end: ClockTime,
  b_start: ClockTime,
  b_end: ClockTime,
) -> bool {
  a_start.minutes() < b_end.minutes() && b_start.minutes() < a_end.minutes()
}

/// The first slot in `schedules` (in iteration order) on `day` that overlaps
/// `[start, end)`, skipping the slot whose id is `exclude`.
pub fn find_conflict<'a>(
  schedules: &'a [Schedule],
  day: Day,
  start: ClockTime,
  end: ClockTime,
  exclude: Option<&EntityId>,
) -> Option<&'a Schedule> {
  schedules.iter().find(|slot| {
    Some(&slot.id) != exclude
      && slot.day == day
      && intervals_overlap(start, end, slot.start_time, slot.end_time)
  })
}

/// Reject a slot that is empty, runs backwards, or overlaps another slot.
pub fn check_slot(
  schedules: &[Schedule],
  day: Day,
  start: ClockTime,
  end: ClockTime,
  exclude: Option<&EntityId>,
) -> Result<(), ValidationError> {
  if end <= start {
    return Err(ValidationError::InvalidTimeRange { start, end });
  }
  match find_conflict(schedules, day, start, end, exclude) {
    Some(existing) => Err(ValidationError::ScheduleConflict {
      day,
      existing: existing.id.clone(),
      existing_start: existing.start_time,
      existing_end: existing.end_time,
    }),
    None => Ok(()),
  }
}

/// Every pair of slots that overlap each other. Used to flag conflicts in
/// data that bypassed validation, such as an imported backup.
pub fn overlapping_pairs(schedules: &[Schedule]) -> Vec<(&Schedule, &Schedule)> {
  let mut pairs = Vec::new();
  for (i, a) in schedules.iter().enumerate() {
    for b in &schedules[i + 1..] {
      if a.day == b.day && intervals_overlap(a.start_time, a.end_time, b.start_time, b.end_time) {
        pairs.push((a, b));
      }
    }
  }
  pairs
}
