//! Encoding and decoding helpers between domain types and the plain-text
//! column representations.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed nine-digit
//! fraction, so lexicographic order matches chronological order down to the
//! nanosecond and range filters can compare strings directly.

use chrono::{DateTime, NaiveDate, Utc};
use covidstats_core::{
  case::{Case, midnight},
  district::District,
  stats::{CaseCount, CasesCountByDate},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed-width, so every encoded value has the same length.
const DT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.format(DT_FORMAT).to_string() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_count(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::CountRange(n))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `person` row.
pub struct RawCase {
  pub id:                    String,
  pub date_of_reporting:     String,
  pub residence_location_id: Option<String>,
}

impl RawCase {
  pub fn into_case(self) -> Result<Case> {
    Ok(Case {
      id:                    self.id,
      reporting_date:        decode_dt(&self.date_of_reporting)?,
      residence_location_id: self.residence_location_id,
      district:              District::Unresolved,
    })
  }
}

/// One `GROUP BY` bucket: the `YYYY-MM-DD` prefix and its row count.
pub struct RawDayCount {
  pub day:   String,
  pub count: i64,
}

impl RawDayCount {
  pub fn into_count(self) -> Result<CaseCount> {
    Ok(CaseCount::new(midnight(decode_day(&self.day)?), decode_count(self.count)?))
  }
}

/// Raw values read from a `covid_cases_stats` row.
pub struct RawStats {
  pub reporting_date: String,
  pub count:          i64,
  pub year:           i32,
  pub month:          String,
}

impl RawStats {
  pub fn into_stats(self) -> Result<CasesCountByDate> {
    Ok(CasesCountByDate {
      reporting_date: decode_dt(&self.reporting_date)?,
      count:          decode_count(self.count)?,
      year:           self.year,
      month:          self.month,
    })
  }
}
