//! [`SqliteStatsStore`]: SQLite implementation of [`StatsStore`].

use std::path::Path;

use chrono::Utc;
use covidstats_core::{
  stats::{CaseCount, CasesCountByDate, daily_records},
  store::StatsStore,
};

use crate::{
  Result,
  encode::{RawStats, encode_dt},
  error::{StoreContext as _, connection_error},
  schema::STATS_SCHEMA,
};

const STORE_NAME: &str = "stats store";

/// Field-level merge: a new key inserts every column, an existing key only
/// has the four synced fields overwritten.
const UPSERT: &str = "
INSERT INTO covid_cases_stats (id, reporting_date, count, year, month, first_synced_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    reporting_date = excluded.reporting_date,
    count          = excluded.count,
    year           = excluded.year,
    month          = excluded.month";

/// The query store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStatsStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStatsStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> covidstats_core::Result<Self> {
    let display = path.as_ref().display().to_string();
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(|e| connection_error(STORE_NAME, &display, e))?;
    let store = Self { conn };
    store
      .init_schema()
      .await
      .map_err(|e| connection_error(STORE_NAME, &display, e))?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> covidstats_core::Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(|e| connection_error(STORE_NAME, ":memory:", e))?;
    let store = Self { conn };
    store
      .init_schema()
      .await
      .map_err(|e| connection_error(STORE_NAME, ":memory:", e))?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(STATS_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write every record inside one transaction; any failure rolls the whole
  /// batch back.
  async fn upsert_batch(&self, records: Vec<CasesCountByDate>) -> Result<usize> {
    let synced_at = encode_dt(Utc::now());
    let rows: Vec<_> = records
      .iter()
      .map(|r| {
        (
          r.key(),
          encode_dt(r.reporting_date),
          i64::from(r.count),
          r.year,
          r.month.clone(),
        )
      })
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT)?;
          for (id, reporting_date, count, year, month) in &rows {
            stmt.execute(rusqlite::params![
              id,
              reporting_date,
              count,
              year,
              month,
              synced_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(written)
  }

  #[cfg(test)]
  pub(crate) async fn first_synced_at(&self, key: &str) -> Result<Option<String>> {
    use rusqlite::OptionalExtension as _;

    let key = key.to_owned();
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT first_synced_at FROM covid_cases_stats WHERE id = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  /// Rows where `column = value`, ordered by document key.
  async fn select_where(
    &self,
    column: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<Vec<CasesCountByDate>> {
    let raws: Vec<RawStats> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT reporting_date, count, year, month
           FROM covid_cases_stats
           WHERE {column} = ?1
           ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![value], |row| {
            Ok(RawStats {
              reporting_date: row.get(0)?,
              count:          row.get(1)?,
              year:           row.get(2)?,
              month:          row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStats::into_stats).collect()
  }
}

// ─── StatsStore impl ─────────────────────────────────────────────────────────

impl StatsStore for SqliteStatsStore {
  async fn save(&self, counts: &[CaseCount]) -> covidstats_core::Result<()> {
    let records = daily_records(counts);
    let days = records.len();
    let written = self
      .upsert_batch(records)
      .await
      .sync_context(|| format!("failed to commit batch of {days} daily counts"))?;
    tracing::debug!(written, "committed daily counts");
    Ok(())
  }

  async fn find_by_year(&self, year: i32) -> covidstats_core::Result<Vec<CasesCountByDate>> {
    self
      .select_where("year", rusqlite::types::Value::Integer(i64::from(year)))
      .await
      .query_context(|| format!("failed to find counts for year {year}"))
  }

  async fn find_by_month(&self, month: &str) -> covidstats_core::Result<Vec<CasesCountByDate>> {
    self
      .select_where("month", rusqlite::types::Value::Text(month.to_owned()))
      .await
      .query_context(|| format!("failed to find counts for month {month}"))
  }
}
