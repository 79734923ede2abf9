//! Case records and reference data read from the operational store.
//!
//! Everything here is a read-only snapshot: the sync pipeline never mutates or
//! deletes records in the source store.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::district::District;

/// Classification value carried by confirmed cases in the source store.
pub const CONFIRMED_CLASSIFICATION: &str =
  "LNG_REFERENCE_DATA_CATEGORY_CASE_CLASSIFICATION_CONFIRMED";

// ─── Case ────────────────────────────────────────────────────────────────────

/// A single confirmed case.
///
/// Only the fields the pipeline needs are carried; the filter-only fields
/// (outbreak, classification, deleted flag) stay in the source query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
  pub id:                    String,
  /// Date-only semantics; the time of day is not significant.
  pub reporting_date:        DateTime<Utc>,
  /// Reference into the location hierarchy; may be absent.
  pub residence_location_id: Option<String>,
  /// Populated only after enrichment.
  #[serde(default)]
  pub district:              District,
}

impl Case {
  pub fn new(id: impl Into<String>, reporting_date: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      reporting_date,
      residence_location_id: None,
      district: District::default(),
    }
  }

  pub fn with_residence(mut self, location_id: impl Into<String>) -> Self {
    self.residence_location_id = Some(location_id.into());
    self
  }

  /// The residence reference, treating an empty string as absent.
  pub fn residence(&self) -> Option<&str> {
    self
      .residence_location_id
      .as_deref()
      .filter(|id| !id.trim().is_empty())
  }
}

// ─── Location ────────────────────────────────────────────────────────────────

/// A node in the location hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub id:                 String,
  /// Code of the enclosing administrative region; maps to one district.
  pub parent_location_id: Option<String>,
}

// ─── DateWindow ──────────────────────────────────────────────────────────────

/// A half-open `[start, end)` range over reporting dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

impl DateWindow {
  /// Build a window from `start`; an omitted `end` covers exactly one day.
  pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
    let end = end.unwrap_or_else(|| start + Duration::days(1));
    Self { start, end }
  }

  /// The single day beginning at `start`.
  pub fn day(start: DateTime<Utc>) -> Self { Self::new(start, None) }

  /// The window between two calendar dates, both taken at midnight UTC.
  pub fn dates(start: NaiveDate, end: Option<NaiveDate>) -> Self {
    Self::new(midnight(start), end.map(midnight))
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }

  pub fn is_empty(&self) -> bool { self.end <= self.start }
}

/// Midnight UTC at the start of `date`.
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(NaiveTime::MIN).and_utc()
}
