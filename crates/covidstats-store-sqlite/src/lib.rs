//! SQLite backends for the COVID statistics service.
//!
//! [`SqliteCaseStore`] plays the operational case store and
//! [`SqliteStatsStore`] the read-optimised query store. Both wrap
//! [`tokio_rusqlite`] so database work runs on a dedicated thread without
//! blocking the async runtime.

mod case_store;
mod encode;
mod schema;
mod stats_store;

pub mod error;

pub use case_store::{PersonRecord, SqliteCaseStore};
pub use error::{Error, Result};
pub use stats_store::SqliteStatsStore;

#[cfg(test)]
mod tests;
