//! SQL schemas for the two stores.
//!
//! Executed once at connection startup. Both are idempotent thanks to
//! `CREATE ... IF NOT EXISTS`; `PRAGMA user_version` marks the layout.

/// The operational store: case records and the location hierarchy.
pub const CASES_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS person (
    id                    TEXT PRIMARY KEY,
    outbreak_id           TEXT    NOT NULL,
    classification        TEXT    NOT NULL,
    deleted               INTEGER NOT NULL DEFAULT 0,
    date_of_reporting     TEXT    NOT NULL,   -- RFC 3339 UTC, second precision
    residence_location_id TEXT
);

CREATE TABLE IF NOT EXISTS location (
    id                 TEXT PRIMARY KEY,
    parent_location_id TEXT                   -- administrative region code
);

CREATE INDEX IF NOT EXISTS person_confirmed_idx
    ON person(outbreak_id, classification, deleted, date_of_reporting);

PRAGMA user_version = 1;
";

/// The query store: one row per reporting day.
pub const STATS_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS covid_cases_stats (
    id              TEXT PRIMARY KEY,   -- YYYY-MM-DD
    reporting_date  TEXT    NOT NULL,   -- RFC 3339 UTC, midnight
    count           INTEGER NOT NULL,
    year            INTEGER NOT NULL,
    month           TEXT    NOT NULL,   -- YYYY-MM
    first_synced_at TEXT    NOT NULL    -- set on insert, never merged
);

CREATE INDEX IF NOT EXISTS stats_year_idx  ON covid_cases_stats(year);
CREATE INDEX IF NOT EXISTS stats_month_idx ON covid_cases_stats(month);

PRAGMA user_version = 1;
";
