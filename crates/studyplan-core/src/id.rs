//! Opaque entity identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier shared by every entity kind.
///
/// Freshly minted ids are random 128-bit values rendered as lowercase hex.
/// Ids read back from storage, including ones written by older releases, are
/// kept verbatim; no ordering is implied by any id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
  pub fn generate() -> Self { Self(Uuid::new_v4().simple().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for EntityId {
  fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for EntityId {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}
