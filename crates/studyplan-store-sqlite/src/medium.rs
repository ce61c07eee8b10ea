//! [`SqliteMedium`]: the SQLite implementation of [`Medium`].

use std::{fs, path::Path};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use studyplan_core::medium::Medium;
use tracing::debug;

use crate::{
  Error, Result,
  schema::{SCHEMA, UPSERT},
};

/// A planner medium backed by a single SQLite file.
///
/// Access is synchronous and takes `&mut self` for writes; share it between
/// threads only behind a lock.
pub struct SqliteMedium {
  conn: Connection,
}

impl SqliteMedium {
  /// Open (or create) a store at `path`, creating missing parent
  /// directories, and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }
    let medium = Self { conn: Connection::open(path)? };
    medium.init_schema()?;
    debug!(path = %path.display(), "opened sqlite store");
    Ok(medium)
  }

  /// Open an in-memory store, for tests.
  pub fn open_in_memory() -> Result<Self> {
    let medium = Self { conn: Connection::open_in_memory()? };
    medium.init_schema()?;
    Ok(medium)
  }

  fn init_schema(&self) -> Result<()> {
    self.conn.execute_batch(SCHEMA)?;
    Ok(())
  }

  /// All stored keys, sorted.
  pub fn keys(&self) -> Result<Vec<String>> {
    let mut stmt = self.conn.prepare("SELECT key FROM entries ORDER BY key")?;
    let keys = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(keys)
  }
}

impl Medium for SqliteMedium {
  type Error = Error;

  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(
      self
        .conn
        .query_row(
          "SELECT value FROM entries WHERE key = ?1",
          rusqlite::params![key],
          |row| row.get(0),
        )
        .optional()?,
    )
  }

  fn set(&mut self, key: &str, value: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    self.conn.execute(UPSERT, rusqlite::params![key, value, now])?;
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<()> {
    self
      .conn
      .execute("DELETE FROM entries WHERE key = ?1", rusqlite::params![key])?;
    Ok(())
  }

  /// All entries land in one transaction, or none do.
  fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let tx = self.conn.transaction()?;
    {
      let mut stmt = tx.prepare(UPSERT)?;
      for (key, value) in entries {
        stmt.execute(rusqlite::params![key, value, now])?;
      }
    }
    tx.commit()?;
    Ok(())
  }
}
