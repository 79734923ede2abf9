//! The `CaseSource` and `StatsStore` traits.
//!
//! Backends (e.g. `covidstats-store-sqlite`) implement these; the sync
//! pipeline and the read API depend only on the traits. Every method returns
//! the shared [`Error`](crate::Error) taxonomy, and an empty result set is
//! always `Ok`.
//!
//! Cancellation is the caller's business: dropping a returned future must
//! never leave a partially-applied batch behind.

use std::future::Future;

use crate::{
  Result,
  case::{Case, DateWindow, Location},
  stats::{CaseCount, CasesCountByDate},
};

// ─── Source ──────────────────────────────────────────────────────────────────

/// The operational case-management store, read-only from our side.
///
/// Both case queries select records that belong to `outbreak_id`, carry the
/// confirmed classification, are not deleted, and were reported within
/// `window`.
pub trait CaseSource: Send + Sync {
  /// Fetch the matching cases one row per case.
  fn find_confirmed_cases<'a>(
    &'a self,
    outbreak_id: &'a str,
    window: DateWindow,
  ) -> impl Future<Output = Result<Vec<Case>>> + Send + 'a;

  /// Count the matching cases per reporting day, letting the store do the
  /// grouping. Preferred when no district breakdown is needed.
  fn group_cases_by_date<'a>(
    &'a self,
    outbreak_id: &'a str,
    window: DateWindow,
  ) -> impl Future<Output = Result<Vec<CaseCount>>> + Send + 'a;

  /// Look up a single location. Returns `None` if it does not exist.
  fn find_location_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Location>>> + Send + 'a;
}

// ─── Query store ─────────────────────────────────────────────────────────────

/// The read-optimised store that serves the public API.
pub trait StatsStore: Send + Sync {
  /// Merge-upsert one record per day in a single atomic batch.
  ///
  /// Only `reportingDate`, `count`, `year` and `month` are written; any other
  /// stored field is left as is. A rerun for a day replaces its count, it
  /// never adds to it.
  fn save<'a>(
    &'a self,
    counts: &'a [CaseCount],
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// All stored records whose `year` partition equals `year`.
  fn find_by_year(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Vec<CasesCountByDate>>> + Send + '_;

  /// All stored records whose `month` partition equals `month` (`YYYY-MM`).
  fn find_by_month<'a>(
    &'a self,
    month: &'a str,
  ) -> impl Future<Output = Result<Vec<CasesCountByDate>>> + Send + 'a;
}
