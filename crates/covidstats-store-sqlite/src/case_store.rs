//! [`SqliteCaseStore`]: SQLite implementation of [`CaseSource`].

use std::path::Path;

use covidstats_core::{
  case::{CONFIRMED_CLASSIFICATION, Case, DateWindow, Location},
  stats::CaseCount,
  store::CaseSource,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawCase, RawDayCount, encode_dt},
  error::{StoreContext as _, connection_error},
  schema::CASES_SCHEMA,
};

const STORE_NAME: &str = "case store";

/// Filter shared by both case queries; binds `?1..?4`.
const CONFIRMED_IN_WINDOW: &str = "outbreak_id = ?1
   AND classification = ?2
   AND deleted = 0
   AND date_of_reporting >= ?3
   AND date_of_reporting <  ?4";

// ─── Fixture input ───────────────────────────────────────────────────────────

/// A full `person` row, including the filter-only fields. Used to load
/// fixtures and imports; the sync pipeline itself never writes to this store.
#[derive(Debug, Clone)]
pub struct PersonRecord {
  pub case:           Case,
  pub outbreak_id:    String,
  pub classification: String,
  pub deleted:        bool,
}

impl PersonRecord {
  /// A confirmed, live case in `outbreak_id`.
  pub fn confirmed(outbreak_id: impl Into<String>, case: Case) -> Self {
    Self {
      case,
      outbreak_id: outbreak_id.into(),
      classification: CONFIRMED_CLASSIFICATION.to_owned(),
      deleted: false,
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The operational case store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteCaseStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteCaseStore {
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
        conn.execute_batch(CASES_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert (or replace) person rows in one transaction.
  pub async fn insert_persons(&self, persons: &[PersonRecord]) -> Result<()> {
    let rows: Vec<_> = persons
      .iter()
      .map(|p| {
        (
          p.case.id.clone(),
          p.outbreak_id.clone(),
          p.classification.clone(),
          p.deleted,
          encode_dt(p.case.reporting_date),
          p.case.residence_location_id.clone(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO person (
               id, outbreak_id, classification, deleted,
               date_of_reporting, residence_location_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert (or replace) location rows in one transaction.
  pub async fn insert_locations(&self, locations: &[Location]) -> Result<()> {
    let rows: Vec<(String, Option<String>)> = locations
      .iter()
      .map(|l| (l.id.clone(), l.parent_location_id.clone()))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO location (id, parent_location_id) VALUES (?1, ?2)",
          )?;
          for (id, parent) in &rows {
            stmt.execute(rusqlite::params![id, parent])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_cases(&self, outbreak_id: &str, window: DateWindow) -> Result<Vec<Case>> {
    let outbreak_id = outbreak_id.to_owned();
    let start = encode_dt(window.start);
    let end = encode_dt(window.end);

    let raws: Vec<RawCase> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT id, date_of_reporting, residence_location_id
           FROM person
           WHERE {CONFIRMED_IN_WINDOW}
           ORDER BY date_of_reporting, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![outbreak_id, CONFIRMED_CLASSIFICATION, start, end],
            |row| {
              Ok(RawCase {
                id:                    row.get(0)?,
                date_of_reporting:     row.get(1)?,
                residence_location_id: row.get(2)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCase::into_case).collect()
  }

  async fn count_by_day(&self, outbreak_id: &str, window: DateWindow) -> Result<Vec<CaseCount>> {
    let outbreak_id = outbreak_id.to_owned();
    let start = encode_dt(window.start);
    let end = encode_dt(window.end);

    let raws: Vec<RawDayCount> = self
      .conn
      .call(move |conn| {
        // The first ten characters of an encoded timestamp are its UTC day.
        let sql = format!(
          "SELECT substr(date_of_reporting, 1, 10) AS day, COUNT(*)
           FROM person
           WHERE {CONFIRMED_IN_WINDOW}
           GROUP BY day
           ORDER BY day"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![outbreak_id, CONFIRMED_CLASSIFICATION, start, end],
            |row| Ok(RawDayCount { day: row.get(0)?, count: row.get(1)? }),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDayCount::into_count).collect()
  }

  async fn select_location(&self, id: &str) -> Result<Option<Location>> {
    let id = id.to_owned();
    let location = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, parent_location_id FROM location WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(Location {
                  id:                 row.get(0)?,
                  parent_location_id: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(location)
  }
}

// ─── CaseSource impl ─────────────────────────────────────────────────────────

impl CaseSource for SqliteCaseStore {
  async fn find_confirmed_cases(
    &self,
    outbreak_id: &str,
    window: DateWindow,
  ) -> covidstats_core::Result<Vec<Case>> {
    let cases = self.select_cases(outbreak_id, window).await.query_context(|| {
      format!(
        "failed to retrieve cases for outbreak {outbreak_id} between {} and {}",
        window.start, window.end
      )
    })?;
    tracing::debug!(outbreak_id, found = cases.len(), "fetched confirmed cases");
    Ok(cases)
  }

  async fn group_cases_by_date(
    &self,
    outbreak_id: &str,
    window: DateWindow,
  ) -> covidstats_core::Result<Vec<CaseCount>> {
    let counts = self.count_by_day(outbreak_id, window).await.query_context(|| {
      format!(
        "failed to group cases for outbreak {outbreak_id} between {} and {}",
        window.start, window.end
      )
    })?;
    tracing::debug!(outbreak_id, days = counts.len(), "grouped confirmed cases");
    Ok(counts)
  }

  async fn find_location_by_id(&self, id: &str) -> covidstats_core::Result<Option<Location>> {
    self
      .select_location(id)
      .await
      .query_context(|| format!("failed to look up location {id}"))
  }
}
