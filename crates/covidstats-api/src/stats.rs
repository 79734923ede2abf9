//! Handlers for the daily-count endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/byYear` | Current calendar year |
//! | `GET`  | `/byYear/{year}` | Non-numeric or non-positive year means current year |
//! | `GET`  | `/byMonth/{month}` | `month` is `YYYY-MM`; anything else is 400 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{Datelike as _, Utc};
use covidstats_core::{
  stats::{CasesCountByDate, is_month_partition},
  store::StatsStore,
};

use crate::error::ApiError;

/// The year to serve for a raw path segment.
pub fn year_or_current(raw: Option<&str>) -> i32 {
  raw
    .and_then(|s| s.trim().parse::<i32>().ok())
    .filter(|year| *year > 0)
    .unwrap_or_else(|| Utc::now().year())
}

fn sorted(mut records: Vec<CasesCountByDate>) -> Vec<CasesCountByDate> {
  records.sort_by_key(|r| r.reporting_date);
  records
}

// ─── By year ──────────────────────────────────────────────────────────────────

/// `GET /byYear/{year}`
pub async fn by_year<S>(
  State(store): State<Arc<S>>,
  Path(year): Path<String>,
) -> Result<Json<Vec<CasesCountByDate>>, ApiError>
where
  S: StatsStore,
{
  let year = year_or_current(Some(&year));
  Ok(Json(sorted(store.find_by_year(year).await?)))
}

/// `GET /byYear`
pub async fn current_year<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CasesCountByDate>>, ApiError>
where
  S: StatsStore,
{
  let year = year_or_current(None);
  Ok(Json(sorted(store.find_by_year(year).await?)))
}

// ─── By month ─────────────────────────────────────────────────────────────────

/// `GET /byMonth/{month}`
pub async fn by_month<S>(
  State(store): State<Arc<S>>,
  Path(month): Path<String>,
) -> Result<Json<Vec<CasesCountByDate>>, ApiError>
where
  S: StatsStore,
{
  if !is_month_partition(&month) {
    return Err(ApiError::BadRequest(format!("month must be YYYY-MM, got {month:?}")));
  }
  Ok(Json(sorted(store.find_by_month(&month).await?)))
}
