//! Per-day case counts: the transient aggregation result and the persisted
//! read-model record.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{case::midnight, district::District};

// ─── CaseCount ───────────────────────────────────────────────────────────────

/// The number of cases reported on one day, optionally narrowed to a
/// district. Produced by a source or the aggregator, consumed by a
/// [`StatsStore`](crate::store::StatsStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseCount {
  pub reporting_date: DateTime<Utc>,
  pub count:          u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub district:       Option<District>,
}

impl CaseCount {
  pub fn new(reporting_date: DateTime<Utc>, count: u32) -> Self {
    Self { reporting_date, count, district: None }
  }

  pub fn for_district(
    reporting_date: DateTime<Utc>,
    district: District,
    count: u32,
  ) -> Self {
    Self { reporting_date, count, district: Some(district) }
  }

  pub fn day(&self) -> NaiveDate { self.reporting_date.date_naive() }
}

// ─── CasesCountByDate ────────────────────────────────────────────────────────

/// A persisted daily count, keyed by [`document_key`] and carrying the
/// `year` / `month` partition fields used for range reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasesCountByDate {
  pub reporting_date: DateTime<Utc>,
  pub count:          u32,
  pub year:           i32,
  /// `YYYY-MM`, month zero-padded.
  pub month:          String,
}

impl CasesCountByDate {
  /// Derive the stored record for a day's count. The timestamp is normalised
  /// to midnight UTC so reruns for the same day write identical values.
  pub fn from_count(count: &CaseCount) -> Self {
    let day = count.day();
    Self {
      reporting_date: midnight(day),
      count:          count.count,
      year:           day.year(),
      month:          month_partition(day),
    }
  }

  pub fn key(&self) -> String { document_key(self.reporting_date.date_naive()) }
}

/// The stable document key for a day: `YYYY-MM-DD`.
pub fn document_key(day: NaiveDate) -> String { day.format("%Y-%m-%d").to_string() }

/// The month partition value for a day: `YYYY-MM`.
pub fn month_partition(day: NaiveDate) -> String {
  format!("{}-{:02}", day.year(), day.month())
}

/// Validate a `YYYY-MM` partition string.
pub fn is_month_partition(month: &str) -> bool {
  NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok()
    && month.len() == 7
}

/// Collapse counts that fall on the same day into one record per day.
/// Output is ordered by day.
///
/// District-tagged counts are partial counts of their day and are summed. A
/// count without a district is a whole-day total and replaces whatever the
/// day held so far, so the last one in the batch wins.
pub fn daily_records(counts: &[CaseCount]) -> Vec<CasesCountByDate> {
  let mut per_day = std::collections::BTreeMap::<NaiveDate, u32>::new();
  for c in counts {
    let total = per_day.entry(c.day()).or_default();
    match c.district {
      Some(_) => *total += c.count,
      None => *total = c.count,
    }
  }
  per_day
    .into_iter()
    .map(|(day, count)| CasesCountByDate::from_count(&CaseCount::new(midnight(day), count)))
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn key_and_partitions_for_a_day() {
    let at = Utc.with_ymd_and_hms(2021, 8, 9, 0, 0, 0).unwrap();
    let record = CasesCountByDate::from_count(&CaseCount::new(at, 3));
    assert_eq!(record.key(), "2021-08-09");
    assert_eq!(record.year, 2021);
    assert_eq!(record.month, "2021-08");
    assert_eq!(record.count, 3);
  }

  #[test]
  fn time_of_day_is_dropped() {
    let at = Utc.with_ymd_and_hms(2021, 12, 31, 17, 45, 2).unwrap();
    let record = CasesCountByDate::from_count(&CaseCount::new(at, 1));
    assert_eq!(record.key(), "2021-12-31");
    assert_eq!(record.month, "2021-12");
    assert_eq!(record.reporting_date, Utc.with_ymd_and_hms(2021, 12, 31, 0, 0, 0).unwrap());
  }

  #[test]
  fn month_partition_validation() {
    assert!(is_month_partition("2021-08"));
    assert!(!is_month_partition("2021-8"));
    assert!(!is_month_partition("2021-13"));
    assert!(!is_month_partition("august"));
  }

  #[test]
  fn same_day_counts_are_summed_within_a_batch() {
    let day = Utc.with_ymd_and_hms(2021, 8, 9, 0, 0, 0).unwrap();
    let next = Utc.with_ymd_and_hms(2021, 8, 10, 0, 0, 0).unwrap();
    let records = daily_records(&[
      CaseCount::for_district(day, District::Cayo, 2),
      CaseCount::new(next, 4),
      CaseCount::for_district(day, District::Toledo, 1),
    ]);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key(), "2021-08-09");
    assert_eq!(records[0].count, 3);
    assert_eq!(records[1].count, 4);
  }

  #[test]
  fn last_whole_day_total_wins_within_a_batch() {
    let day = Utc.with_ymd_and_hms(2021, 8, 9, 0, 0, 0).unwrap();
    let records = daily_records(&[CaseCount::new(day, 5), CaseCount::new(day, 3)]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].count, 3);
  }

  #[test]
  fn persisted_json_uses_camel_case() {
    let at = Utc.with_ymd_and_hms(2021, 8, 9, 0, 0, 0).unwrap();
    let record = CasesCountByDate::from_count(&CaseCount::new(at, 3));
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["count"], 3);
    assert_eq!(json["year"], 2021);
    assert_eq!(json["month"], "2021-08");
    assert!(json.get("reportingDate").is_some());
  }
}
