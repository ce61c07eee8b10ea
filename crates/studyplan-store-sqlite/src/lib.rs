//! SQLite backend for the study planner.
//!
//! Provides [`SqliteMedium`], a [`studyplan_core::medium::Medium`] that keeps
//! each key as one row of a single SQLite file.

mod medium;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use medium::SqliteMedium;

#[cfg(test)]
mod tests;
