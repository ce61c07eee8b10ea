//! Core types and integrity rules for the study planner.
//!
//! This crate has no database or CLI dependencies. Storage
//! backends implement [`medium::Medium`]; everything above that seam (typed
//! collections, validation, cascades, backup, analytics) lives here.

pub mod backup;
pub mod conflict;
pub mod error;
pub mod id;
pub mod medium;
pub mod migrate;
pub mod planner;
pub mod schedule;
pub mod settings;
pub mod stats;
pub mod store;
pub mod subject;
pub mod task;

pub use error::{Error, Result, ValidationError};
pub use id::EntityId;
pub use planner::{Planner, RemovedSubject};

#[cfg(test)]
mod tests;
