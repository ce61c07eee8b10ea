//! The durable key-value medium the entity store writes through.
//!
//! Implemented by storage backends (e.g. `studyplan-store-sqlite`). Values
//! are opaque strings; the store above decides what goes in them.

use std::{collections::BTreeMap, convert::Infallible};

/// A string-keyed, string-valued durable medium.
///
/// A single `set` must be atomic. `set_many` writes entries one at a time by
/// default; backends that can apply a group of writes atomically should
/// override it.
pub trait Medium {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value under `key`, or `None` if the key was never written.
  fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

  /// Replace the value under `key`.
  fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;

  fn remove(&mut self, key: &str) -> Result<(), Self::Error>;

  fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), Self::Error> {
    for (key, value) in entries {
      self.set(key, value)?;
    }
    Ok(())
  }
}

/// An in-process medium; contents vanish with the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
  entries: BTreeMap<String, String>,
}

impl MemoryMedium {
  pub fn new() -> Self { Self::default() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Medium for MemoryMedium {
  type Error = Infallible;

  fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), Infallible> {
    self.entries.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), Infallible> {
    self.entries.remove(key);
    Ok(())
  }
}
