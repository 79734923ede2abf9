//! District enrichment: a lookup-then-resolve join from each case's residence
//! location to its district.
//!
//! Lookups fan out with a bounded number in flight. The batch is fail-fast:
//! the first lookup that errors (or points at a missing location) aborts the
//! whole call and drops the lookups still running.

use futures::{StreamExt as _, TryStreamExt as _, stream};

use crate::{
  Error, Result,
  case::Case,
  district::{District, DistrictResolver},
  store::CaseSource,
};

/// Default cap on concurrent location lookups.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Attach a district to every case. Output order matches input order.
///
/// Cases without a residence reference keep [`District::Unresolved`] and
/// cost no lookup.
pub async fn add_district_to_cases<S>(
  source: &S,
  resolver: &DistrictResolver,
  cases: Vec<Case>,
  concurrency: usize,
) -> Result<Vec<Case>>
where
  S: CaseSource + ?Sized,
{
  stream::iter(cases)
    .map(|case| enrich_one(source, resolver, case))
    .buffered(concurrency.max(1))
    .try_collect()
    .await
}

async fn enrich_one<S>(
  source: &S,
  resolver: &DistrictResolver,
  mut case: Case,
) -> Result<Case>
where
  S: CaseSource + ?Sized,
{
  let Some(location_id) = case.residence().map(str::to_owned) else {
    case.district = District::Unresolved;
    return Ok(case);
  };

  let location = source
    .find_location_by_id(&location_id)
    .await
    .map_err(|e| Error::Enrichment {
      case_id: case.id.clone(),
      reason:  format!("lookup of location {location_id} failed"),
      source:  Some(e.into()),
    })?
    .ok_or_else(|| Error::Enrichment {
      case_id: case.id.clone(),
      reason:  format!("location {location_id} does not exist"),
      source:  None,
    })?;

  case.district = location
    .parent_location_id
    .as_deref()
    .map(|code| resolver.resolve(code))
    .unwrap_or_default();

  if case.district == District::Unresolved {
    tracing::warn!(
      case_id = %case.id,
      location_id = %location_id,
      parent = ?location.parent_location_id,
      "no district for parent location"
    );
  }

  Ok(case)
}
