//! [`EntityStore`]: typed whole-collection access over a [`Medium`].
//!
//! Each collection lives as one JSON array under a fixed key, and settings as
//! one JSON object. Every read deserializes afresh, so returned values are
//! independent copies. Writes replace the whole collection.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{Error, Result, id::EntityId, medium::Medium, settings::Settings};

/// Keys under which the store keeps its values.
pub mod keys {
  pub const SUBJECTS: &str = "subjects";
  pub const SCHEDULES: &str = "schedules";
  pub const TASKS: &str = "tasks";
  pub const SETTINGS: &str = "settings";

  /// Per-user data map written by the multi-user layout.
  pub const USER_DATA: &str = "userData";
  /// The user selected in the multi-user layout.
  pub const CURRENT_USER: &str = "currentUser";
}

/// An entity kind stored as one collection.
pub trait Collection: Serialize + DeserializeOwned + Clone {
  const KEY: &'static str;

  fn id(&self) -> &EntityId;
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A group of writes committed together through [`Medium::set_many`].
///
/// Writing any collection stamps `settings.lastBackup`, unless the batch
/// carries its own settings or the stamp was switched off.
#[derive(Debug, Default)]
pub struct Batch {
  entries:      Vec<(&'static str, String)>,
  has_settings: bool,
  stamp:        bool,
  no_stamp:     bool,
}

impl Batch {
  pub fn new() -> Self { Self::default() }

  /// A batch that never touches `lastBackup` on its own.
  pub fn without_backup_stamp() -> Self {
    Self { no_stamp: true, ..Self::default() }
  }

  pub fn put_collection<C: Collection>(&mut self, items: &[C]) -> Result<&mut Self> {
    self.put(C::KEY, serde_json::to_string(items)?);
    self.stamp = true;
    Ok(self)
  }

  pub fn put_settings(&mut self, settings: &Settings) -> Result<&mut Self> {
    self.put(keys::SETTINGS, serde_json::to_string(settings)?);
    self.has_settings = true;
    Ok(self)
  }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  fn put(&mut self, key: &'static str, value: String) {
    self.entries.retain(|(k, _)| *k != key);
    self.entries.push((key, value));
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Typed access to the planner's collections on top of a raw [`Medium`].
#[derive(Debug, Clone)]
pub struct EntityStore<M> {
  medium: M,
}

impl<M: Medium> EntityStore<M> {
  pub fn new(medium: M) -> Self { Self { medium } }

  pub fn medium(&self) -> &M { &self.medium }

  pub fn into_medium(self) -> M { self.medium }

  /// Every entity of kind `C`, in stored order. An absent or unreadable key
  /// reads as an empty collection.
  pub fn get_all<C: Collection>(&self) -> Result<Vec<C>> {
    Ok(self.read(C::KEY)?.unwrap_or_default())
  }

  pub fn get_by_id<C: Collection>(&self, id: &EntityId) -> Result<Option<C>> {
    Ok(self.get_all::<C>()?.into_iter().find(|item| item.id() == id))
  }

  /// Replace the whole collection of kind `C` and stamp `lastBackup`.
  pub fn set_all<C: Collection>(&mut self, items: &[C]) -> Result<()> {
    let mut batch = Batch::new();
    batch.put_collection(items)?;
    self.commit(batch)
  }

  /// Stored settings, or the defaults when absent or unreadable.
  pub fn settings(&self) -> Result<Settings> {
    Ok(self.read(keys::SETTINGS)?.unwrap_or_default())
  }

  /// Replace the settings record. Does not stamp `lastBackup`.
  pub fn set_settings(&mut self, settings: &Settings) -> Result<()> {
    let mut batch = Batch::new();
    batch.put_settings(settings)?;
    self.commit(batch)
  }

  /// Apply every write in `batch` as one `set_many` call.
  pub fn commit(&mut self, mut batch: Batch) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    if batch.stamp && !batch.has_settings && !batch.no_stamp {
      let mut settings = self.settings()?;
      settings.last_backup = Some(Utc::now());
      batch.put_settings(&settings)?;
    }

    self.medium.set_many(&batch.entries).map_err(Error::medium)?;
    debug!(
      keys = ?batch.entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
      "committed store batch"
    );
    Ok(())
  }

  /// The raw stored string under `key`, bypassing deserialization.
  pub fn read_raw(&self, key: &str) -> Result<Option<String>> {
    self.medium.get(key).map_err(Error::medium)
  }

  fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let Some(raw) = self.read_raw(key)? else {
      return Ok(None);
    };
    match serde_json::from_str(&raw) {
      Ok(value) => Ok(Some(value)),
      Err(err) => {
        warn!(key, %err, "stored value is malformed; falling back to default");
        Ok(None)
      }
    }
  }
}
