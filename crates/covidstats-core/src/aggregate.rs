//! Client-side aggregation over already-fetched cases.
//!
//! Used when the source cannot group server-side, or when cases had to be
//! enriched with a district first. Both functions are pure; the output does
//! not depend on input order and is returned sorted by day (then district).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
  case::{Case, midnight},
  district::District,
  stats::CaseCount,
};

/// Count cases per reporting day.
pub fn by_date(cases: &[Case]) -> Vec<CaseCount> {
  let mut buckets = BTreeMap::<NaiveDate, u32>::new();
  for case in cases {
    *buckets.entry(case.reporting_date.date_naive()).or_default() += 1;
  }
  buckets
    .into_iter()
    .map(|(day, count)| CaseCount::new(midnight(day), count))
    .collect()
}

/// Count cases per `(reporting day, district)`.
pub fn by_date_and_district(cases: &[Case]) -> Vec<CaseCount> {
  let mut buckets = BTreeMap::<(NaiveDate, District), u32>::new();
  for case in cases {
    *buckets
      .entry((case.reporting_date.date_naive(), case.district))
      .or_default() += 1;
  }
  buckets
    .into_iter()
    .map(|((day, district), count)| {
      CaseCount::for_district(midnight(day), district, count)
    })
    .collect()
}
