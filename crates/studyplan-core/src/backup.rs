//! Whole-data-set export and import.
//!
//! An export is one pretty-printed JSON object:
//!
//! ```json
//! { "subjects": [...], "schedules": [...], "tasks": [...],
//!   "settings": {...}, "exportDate": "..." }
//! ```
//!
//! Import accepts any subset of those fields. Fields that are present replace
//! the live collection wholesale; absent fields leave it alone. The document
//! is parsed and type-checked in full before anything is written, and all
//! writes go out in one batch.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Error, Result,
  conflict,
  id::EntityId,
  medium::Medium,
  schedule::Schedule,
  settings::Settings,
  store::{Batch, EntityStore},
  subject::Subject,
  task::Task,
};

/// A point-in-time copy of every collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
  pub subjects:    Vec<Subject>,
  pub schedules:   Vec<Schedule>,
  pub tasks:       Vec<Task>,
  pub settings:    Settings,
  pub export_date: DateTime<Utc>,
}

/// Import input; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
  subjects:  Option<Vec<Subject>>,
  schedules: Option<Vec<Schedule>>,
  tasks:     Option<Vec<Task>>,
  settings:  Option<Settings>,
}

/// How many entities each imported collection held; `None` for collections
/// the document did not contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub subjects:  Option<usize>,
  pub schedules: Option<usize>,
  pub tasks:     Option<usize>,
  pub settings:  bool,
}

pub fn snapshot<M: Medium>(store: &EntityStore<M>, at: DateTime<Utc>) -> Result<Snapshot> {
  Ok(Snapshot {
    subjects:    store.get_all()?,
    schedules:   store.get_all()?,
    tasks:       store.get_all()?,
    settings:    store.settings()?,
    export_date: at,
  })
}

pub fn export<M: Medium>(store: &EntityStore<M>, at: DateTime<Utc>) -> Result<String> {
  let snapshot = snapshot(store, at)?;
  let document = serde_json::to_string_pretty(&snapshot)?;
  info!(
    subjects = snapshot.subjects.len(),
    schedules = snapshot.schedules.len(),
    tasks = snapshot.tasks.len(),
    "exported planner data"
  );
  Ok(document)
}

/// Restore collections from `document`.
///
/// Fails with [`Error::Import`] and writes nothing when the document is not
/// valid JSON or any present field does not match its entity shape.
/// References to unknown subjects and overlapping slots are logged but
/// accepted, so any exported document can be imported again.
pub fn import<M: Medium>(store: &mut EntityStore<M>, document: &str) -> Result<ImportSummary> {
  let doc: ImportDocument = serde_json::from_str(document).map_err(|err| {
    warn!(%err, "rejected import document");
    Error::Import(err)
  })?;

  report_inconsistencies(store, &doc)?;

  let mut batch = Batch::new();
  if let Some(subjects) = &doc.subjects {
    batch.put_collection(subjects)?;
  }
  if let Some(schedules) = &doc.schedules {
    batch.put_collection(schedules)?;
  }
  if let Some(tasks) = &doc.tasks {
    batch.put_collection(tasks)?;
  }
  if let Some(settings) = &doc.settings {
    batch.put_settings(settings)?;
  }
  store.commit(batch)?;

  let summary = ImportSummary {
    subjects:  doc.subjects.as_ref().map(Vec::len),
    schedules: doc.schedules.as_ref().map(Vec::len),
    tasks:     doc.tasks.as_ref().map(Vec::len),
    settings:  doc.settings.is_some(),
  };
  info!(?summary, "imported planner data");
  Ok(summary)
}

/// Suggested file name for an export taken at `at`, e.g.
/// `study-planner-backup-2024-09-01T10-00-00.json`.
pub fn backup_file_name(at: DateTime<Utc>) -> String {
  format!("study-planner-backup-{}.json", at.format("%Y-%m-%dT%H-%M-%S"))
}

fn report_inconsistencies<M: Medium>(store: &EntityStore<M>, doc: &ImportDocument) -> Result<()> {
  let known: HashSet<EntityId> = match &doc.subjects {
    Some(subjects) => subjects.iter().map(|s| s.id.clone()).collect(),
    None => store.get_all::<Subject>()?.into_iter().map(|s| s.id).collect(),
  };

  let dangling_schedules = doc
    .schedules
    .iter()
    .flatten()
    .filter(|s| !known.contains(&s.subject_id))
    .count();
  let dangling_tasks = doc
    .tasks
    .iter()
    .flatten()
    .filter(|t| !known.contains(&t.subject_id))
    .count();
  if dangling_schedules > 0 || dangling_tasks > 0 {
    warn!(
      schedules = dangling_schedules,
      tasks = dangling_tasks,
      "import references subjects that do not exist"
    );
  }

  if let Some(schedules) = &doc.schedules {
    for (a, b) in conflict::overlapping_pairs(schedules) {
      warn!(first = %a.id, second = %b.id, day = %a.day, "imported slots overlap");
    }
  }
  Ok(())
}
