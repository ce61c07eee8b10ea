//! Migration from the multi-user storage layout.
//!
//! Earlier releases kept every user's data in one `userData` map keyed by
//! user name, with the active user under `currentUser`. The single-user
//! layout stores each collection under its own key. Migration copies the
//! current user's collections into any single-user key that is still absent;
//! existing data is never overwritten.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
  Error, Result,
  medium::Medium,
  schedule::Schedule,
  settings::Settings,
  store::{Batch, Collection, EntityStore, keys},
  subject::Subject,
  task::Task,
};

/// What a migration run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
  /// The legacy user whose data was considered, if there was one.
  pub user:   Option<String>,
  /// Keys that were copied into the single-user layout.
  pub copied: Vec<&'static str>,
}

impl MigrationReport {
  pub fn is_noop(&self) -> bool { self.copied.is_empty() }
}

/// Migrate from legacy keys already present in the store's medium.
pub fn migrate_legacy<M: Medium>(store: &mut EntityStore<M>) -> Result<MigrationReport> {
  let (Some(user), Some(raw_data)) = (
    store.read_raw(keys::CURRENT_USER)?,
    store.read_raw(keys::USER_DATA)?,
  ) else {
    return Ok(MigrationReport::default());
  };
  migrate_user_data(store, &user, &raw_data)
}

/// Migrate from a dump of the old browser storage: a JSON object mapping
/// storage keys to their values. Values may be the stored strings themselves
/// or already-parsed JSON.
///
/// Fails with [`Error::Import`] when the dump is not a JSON object.
pub fn migrate_dump<M: Medium>(store: &mut EntityStore<M>, dump: &str) -> Result<MigrationReport> {
  let entries: Map<String, Value> = serde_json::from_str(dump).map_err(Error::Import)?;
  let raw = |key: &str| {
    entries.get(key).map(|value| match value {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    })
  };
  let (Some(user), Some(raw_data)) = (raw(keys::CURRENT_USER), raw(keys::USER_DATA)) else {
    warn!("storage dump has no legacy user data");
    return Ok(MigrationReport::default());
  };
  migrate_user_data(store, &user, &raw_data)
}

fn migrate_user_data<M: Medium>(
  store: &mut EntityStore<M>,
  user: &str,
  raw_data: &str,
) -> Result<MigrationReport> {
  let mut report = MigrationReport::default();

  // The user name may have been stored bare or as a JSON string.
  let user = serde_json::from_str::<String>(user).unwrap_or_else(|_| user.trim().to_owned());
  report.user = Some(user.clone());

  let all_users: Value = match serde_json::from_str(raw_data) {
    Ok(value) => value,
    Err(err) => {
      warn!(%err, "legacy user data is malformed; skipping migration");
      return Ok(report);
    }
  };
  let Some(data) = all_users.get(&user) else {
    warn!(%user, "no legacy data for the current user");
    return Ok(report);
  };

  let mut batch = Batch::without_backup_stamp();
  if let Some(items) = legacy_field::<Vec<Subject>, M>(store, data, Subject::KEY)? {
    batch.put_collection(&items)?;
    report.copied.push(Subject::KEY);
  }
  if let Some(items) = legacy_field::<Vec<Schedule>, M>(store, data, Schedule::KEY)? {
    batch.put_collection(&items)?;
    report.copied.push(Schedule::KEY);
  }
  if let Some(items) = legacy_field::<Vec<Task>, M>(store, data, Task::KEY)? {
    batch.put_collection(&items)?;
    report.copied.push(Task::KEY);
  }
  if let Some(settings) = legacy_field::<Settings, M>(store, data, keys::SETTINGS)? {
    batch.put_settings(&settings)?;
    report.copied.push(keys::SETTINGS);
  }
  store.commit(batch)?;

  if !report.is_noop() {
    info!(%user, copied = ?report.copied, "migrated legacy multi-user data");
  }
  Ok(report)
}

/// The legacy value for `key`, if the single-user key is still free and the
/// legacy value is present and well-formed.
fn legacy_field<T: DeserializeOwned, M: Medium>(
  store: &EntityStore<M>,
  data: &Value,
  key: &'static str,
) -> Result<Option<T>> {
  if store.read_raw(key)?.is_some() {
    return Ok(None);
  }
  let Some(value) = data.get(key).filter(|v| !v.is_null()) else {
    return Ok(None);
  };
  match T::deserialize(value) {
    Ok(parsed) => Ok(Some(parsed)),
    Err(err) => {
      warn!(key, %err, "legacy collection is malformed; not copied");
      Ok(None)
    }
  }
}
