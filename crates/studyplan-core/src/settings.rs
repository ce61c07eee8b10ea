//! Settings: the singleton preferences record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub theme:       Theme,
  /// Last time any subject, schedule or task collection was written.
  pub last_backup: Option<DateTime<Utc>>,
}

/// Partial update for [`Settings`]; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
  pub theme: Option<Theme>,
}

impl SettingsPatch {
  pub fn apply_to(self, settings: &mut Settings) {
    if let Some(theme) = self.theme {
      settings.theme = theme;
    }
  }
}
