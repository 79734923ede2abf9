//! Error type for `covidstats-store-sqlite`.
//!
//! Backend methods work in terms of [`Error`]; the trait impls translate it
//! into the shared [`covidstats_core::Error`] kinds with operation context.

use covidstats_core::error::BoxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("count out of range: {0}")]
  CountRange(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Attach operation context and pick the core error kind.
pub(crate) trait StoreContext<T> {
  fn query_context(self, reason: impl FnOnce() -> String) -> covidstats_core::Result<T>;
  fn sync_context(self, reason: impl FnOnce() -> String) -> covidstats_core::Result<T>;
}

impl<T, E> StoreContext<T> for std::result::Result<T, E>
where
  E: Into<BoxError>,
{
  fn query_context(self, reason: impl FnOnce() -> String) -> covidstats_core::Result<T> {
    self.map_err(|e| covidstats_core::Error::query(reason(), e))
  }

  fn sync_context(self, reason: impl FnOnce() -> String) -> covidstats_core::Result<T> {
    self.map_err(|e| covidstats_core::Error::sync(reason(), e))
  }
}

/// Wrap a failure to open a database file.
pub(crate) fn connection_error(
  store: &'static str,
  path: &str,
  source: impl Into<BoxError>,
) -> covidstats_core::Error {
  covidstats_core::Error::Connection {
    store,
    reason: format!("cannot open {path}"),
    source: source.into(),
  }
}
