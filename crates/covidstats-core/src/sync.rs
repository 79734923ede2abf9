//! The sync pipeline: count confirmed cases in the source store and
//! merge-upsert the daily totals into the query store.
//!
//! One run is one source query (or one fetch plus an enrichment fan-out)
//! followed by at most one batch commit.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  Result,
  aggregate,
  case::DateWindow,
  district::DistrictResolver,
  enrich::{self, DEFAULT_CONCURRENCY},
  stats::CaseCount,
  store::{CaseSource, StatsStore},
};

/// How the daily counts are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
  /// Let the source group and count; no per-case rows are transferred.
  #[default]
  Grouped,
  /// Fetch cases, attach districts, and aggregate client-side. Produces a
  /// per-district breakdown alongside the daily totals.
  ByDistrict,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
  pub outbreak_id:  String,
  pub window:       DateWindow,
  pub mode:         SyncMode,
  /// Individual cases fetched; `None` when the source did the grouping.
  pub cases_seen:   Option<usize>,
  /// Daily totals, as written to the query store.
  pub days:         Vec<CaseCount>,
  /// Per-district counts; empty unless the mode was `ByDistrict`.
  pub districts:    Vec<CaseCount>,
  pub days_written: usize,
}

/// Wires a [`CaseSource`] to a [`StatsStore`].
pub struct Synchronizer<C, S> {
  source:      Arc<C>,
  stats:       Arc<S>,
  resolver:    DistrictResolver,
  concurrency: usize,
}

impl<C, S> Synchronizer<C, S>
where
  C: CaseSource,
  S: StatsStore,
{
  pub fn new(source: Arc<C>, stats: Arc<S>) -> Self {
    Self {
      source,
      stats,
      resolver: DistrictResolver::default(),
      concurrency: DEFAULT_CONCURRENCY,
    }
  }

  pub fn with_resolver(mut self, resolver: DistrictResolver) -> Self {
    self.resolver = resolver;
    self
  }

  /// Cap on in-flight location lookups in [`SyncMode::ByDistrict`].
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency;
    self
  }

  /// Run one sync over `window`.
  ///
  /// Errors from either store are returned as-is; when the source side fails
  /// nothing is written.
  pub async fn run(
    &self,
    outbreak_id: &str,
    window: DateWindow,
    mode: SyncMode,
  ) -> Result<SyncReport> {
    tracing::info!(
      outbreak_id,
      start = %window.start,
      end = %window.end,
      ?mode,
      "starting case sync"
    );

    let (cases_seen, days, districts) = match mode {
      SyncMode::Grouped => {
        let days = self.source.group_cases_by_date(outbreak_id, window).await?;
        (None, days, Vec::new())
      }
      SyncMode::ByDistrict => {
        let cases = self.source.find_confirmed_cases(outbreak_id, window).await?;
        let seen = cases.len();
        let cases = enrich::add_district_to_cases(
          self.source.as_ref(),
          &self.resolver,
          cases,
          self.concurrency,
        )
        .await?;
        (
          Some(seen),
          aggregate::by_date(&cases),
          aggregate::by_date_and_district(&cases),
        )
      }
    };

    let days_written = if days.is_empty() {
      tracing::info!(outbreak_id, "no confirmed cases in window; nothing to write");
      0
    } else {
      self.stats.save(&days).await?;
      days.len()
    };

    tracing::info!(outbreak_id, days_written, "case sync finished");

    Ok(SyncReport {
      outbreak_id: outbreak_id.to_owned(),
      window,
      mode,
      cases_seen,
      days,
      districts,
      days_written,
    })
  }
}
