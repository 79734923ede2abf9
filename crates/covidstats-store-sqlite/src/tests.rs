//! Integration tests for the SQLite stores against in-memory databases.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use covidstats_core::{
  ErrorKind,
  case::{Case, DateWindow, Location},
  district::District,
  stats::CaseCount,
  store::{CaseSource, StatsStore},
  sync::{SyncMode, Synchronizer},
};

use crate::{PersonRecord, SqliteCaseStore, SqliteStatsStore};

fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2021, month, day, hour, 0, 0).unwrap()
}

fn aug(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2021, 8, day).unwrap() }

async fn cases() -> SqliteCaseStore {
  SqliteCaseStore::open_in_memory()
    .await
    .expect("in-memory case store")
}

async fn stats() -> SqliteStatsStore {
  SqliteStatsStore::open_in_memory()
    .await
    .expect("in-memory stats store")
}

/// Three confirmed cases on 2021-08-09 and two on 2021-08-10 for outbreak
/// `X`, plus rows every filter has to reject.
async fn seeded() -> SqliteCaseStore {
  let store = cases().await;

  let mut not_confirmed = PersonRecord::confirmed("X", Case::new("suspect", at(8, 9, 5)));
  not_confirmed.classification = "LNG_REFERENCE_DATA_CATEGORY_CASE_CLASSIFICATION_SUSPECT".into();
  let mut deleted = PersonRecord::confirmed("X", Case::new("deleted", at(8, 9, 6)));
  deleted.deleted = true;

  store
    .insert_persons(&[
      PersonRecord::confirmed("X", Case::new("a", at(8, 9, 0)).with_residence("loc-cayo")),
      PersonRecord::confirmed("X", Case::new("b", at(8, 9, 12)).with_residence("loc-cayo")),
      PersonRecord::confirmed("X", Case::new("c", at(8, 9, 23)).with_residence("loc-tol")),
      PersonRecord::confirmed("X", Case::new("d", at(8, 10, 0)).with_residence("loc-tol")),
      PersonRecord::confirmed("X", Case::new("e", at(8, 10, 9))),
      PersonRecord::confirmed("Y", Case::new("other", at(8, 9, 3))),
      not_confirmed,
      deleted,
    ])
    .await
    .unwrap();

  store
    .insert_locations(&[
      Location { id: "loc-cayo".into(), parent_location_id: Some("BZ-CY".into()) },
      Location { id: "loc-tol".into(), parent_location_id: Some("BZ-TOL".into()) },
    ])
    .await
    .unwrap();

  store
}

// ─── Case source ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_window_is_one_half_open_day() {
  let store = seeded().await;
  let found = store
    .find_confirmed_cases("X", DateWindow::dates(aug(9), None))
    .await
    .unwrap();

  let ids: Vec<_> = found.iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, vec!["a", "b", "c"]);
  assert_eq!(found[0].residence_location_id.as_deref(), Some("loc-cayo"));
  assert!(found.iter().all(|c| c.district == District::Unresolved));
}

#[tokio::test]
async fn explicit_window_spans_days() {
  let store = seeded().await;
  let found = store
    .find_confirmed_cases("X", DateWindow::dates(aug(1), Some(aug(31))))
    .await
    .unwrap();
  assert_eq!(found.len(), 5);
}

#[tokio::test]
async fn sub_second_bounds_are_honoured() {
  let store = cases().await;
  let ms = |n| chrono::Duration::milliseconds(n);
  let ten = at(8, 9, 10);
  store
    .insert_persons(&[
      PersonRecord::confirmed("X", Case::new("early", ten + ms(200))),
      PersonRecord::confirmed("X", Case::new("on-start", ten + ms(500))),
      PersonRecord::confirmed("X", Case::new("before-end", ten + ms(700))),
      PersonRecord::confirmed("X", Case::new("on-end", ten + ms(900))),
    ])
    .await
    .unwrap();

  let window = DateWindow::new(ten + ms(500), Some(ten + ms(900)));
  let found = store.find_confirmed_cases("X", window).await.unwrap();
  let ids: Vec<_> = found.iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, vec!["on-start", "before-end"]);
  assert_eq!(found[0].reporting_date, ten + ms(500));

  let grouped = store
    .group_cases_by_date("X", DateWindow::day(ten + ms(500)))
    .await
    .unwrap();
  assert_eq!(grouped, vec![CaseCount::new(at(8, 9, 0), 3)]);
}

#[tokio::test]
async fn no_matches_is_an_empty_success() {
  let store = seeded().await;
  let window = DateWindow::dates(aug(20), None);

  assert!(store.find_confirmed_cases("X", window).await.unwrap().is_empty());
  assert!(store.group_cases_by_date("X", window).await.unwrap().is_empty());
  assert!(
    store
      .find_confirmed_cases("nobody", DateWindow::dates(aug(9), None))
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn grouping_counts_per_day_at_the_source() {
  let store = seeded().await;

  let one_day = store
    .group_cases_by_date("X", DateWindow::dates(aug(9), None))
    .await
    .unwrap();
  assert_eq!(one_day, vec![CaseCount::new(at(8, 9, 0), 3)]);

  let two_days = store
    .group_cases_by_date("X", DateWindow::dates(aug(9), Some(aug(11))))
    .await
    .unwrap();
  assert_eq!(two_days, vec![
    CaseCount::new(at(8, 9, 0), 3),
    CaseCount::new(at(8, 10, 0), 2),
  ]);
}

#[tokio::test]
async fn location_lookup() {
  let store = seeded().await;
  let found = store.find_location_by_id("loc-tol").await.unwrap().unwrap();
  assert_eq!(found.parent_location_id.as_deref(), Some("BZ-TOL"));
  assert!(store.find_location_by_id("loc-nowhere").await.unwrap().is_none());
}

// ─── Stats store ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_derives_key_year_and_month() {
  let s = stats().await;
  s.save(&[CaseCount::new(at(8, 9, 0), 3)]).await.unwrap();

  let by_month = s.find_by_month("2021-08").await.unwrap();
  assert_eq!(by_month.len(), 1);
  assert_eq!(by_month[0].key(), "2021-08-09");
  assert_eq!(by_month[0].year, 2021);
  assert_eq!(by_month[0].month, "2021-08");
  assert_eq!(by_month[0].count, 3);

  assert_eq!(s.find_by_year(2021).await.unwrap(), by_month);
  assert!(s.find_by_year(2020).await.unwrap().is_empty());
  assert!(s.find_by_month("2021-09").await.unwrap().is_empty());
}

#[tokio::test]
async fn saving_twice_is_idempotent() {
  let s = stats().await;
  let batch = [CaseCount::new(at(8, 9, 0), 3), CaseCount::new(at(9, 1, 0), 7)];

  s.save(&batch).await.unwrap();
  let once = s.find_by_year(2021).await.unwrap();

  s.save(&batch).await.unwrap();
  assert_eq!(s.find_by_year(2021).await.unwrap(), once);
}

#[tokio::test]
async fn rerun_overwrites_instead_of_accumulating() {
  let s = stats().await;
  s.save(&[CaseCount::new(at(8, 9, 0), 5)]).await.unwrap();
  s.save(&[CaseCount::new(at(8, 9, 0), 3)]).await.unwrap();

  let found = s.find_by_month("2021-08").await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].count, 3);
}

#[tokio::test]
async fn merge_leaves_other_columns_untouched() {
  let s = stats().await;
  s.save(&[CaseCount::new(at(8, 9, 0), 5)]).await.unwrap();
  let first = s.first_synced_at("2021-08-09").await.unwrap().unwrap();

  tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
  s.save(&[CaseCount::new(at(8, 9, 0), 6)]).await.unwrap();

  assert_eq!(s.first_synced_at("2021-08-09").await.unwrap().unwrap(), first);
  assert_eq!(s.find_by_month("2021-08").await.unwrap()[0].count, 6);
}

#[tokio::test]
async fn same_day_counts_in_one_batch_are_summed() {
  let s = stats().await;
  s.save(&[
    CaseCount::for_district(at(8, 9, 0), District::Cayo, 2),
    CaseCount::for_district(at(8, 9, 0), District::Toledo, 1),
  ])
  .await
  .unwrap();
  assert_eq!(s.find_by_month("2021-08").await.unwrap()[0].count, 3);
}

#[tokio::test]
async fn repeated_day_totals_in_one_batch_keep_the_last() {
  let s = stats().await;
  s.save(&[CaseCount::new(at(8, 9, 0), 5), CaseCount::new(at(8, 9, 0), 3)])
    .await
    .unwrap();
  assert_eq!(s.find_by_month("2021-08").await.unwrap()[0].count, 3);
}

#[tokio::test]
async fn year_filter_spans_months() {
  let s = stats().await;
  s.save(&[
    CaseCount::new(at(1, 31, 0), 1),
    CaseCount::new(at(8, 9, 0), 2),
    CaseCount::new(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(), 4),
  ])
  .await
  .unwrap();

  let year = s.find_by_year(2021).await.unwrap();
  let months: Vec<_> = year.iter().map(|r| r.month.as_str()).collect();
  assert_eq!(months, vec!["2021-01", "2021-08"]);
}

#[tokio::test]
async fn unopenable_path_is_a_connection_error() {
  let err = SqliteStatsStore::open("/nonexistent-dir/for/sure/stats.db")
    .await
    .err()
    .unwrap();
  assert_eq!(err.kind(), ErrorKind::Connection);
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn grouped_sync_then_read_by_month() {
  let source = Arc::new(seeded().await);
  let sink = Arc::new(stats().await);

  let report = Synchronizer::new(source, sink.clone())
    .run("X", DateWindow::dates(aug(9), None), SyncMode::Grouped)
    .await
    .unwrap();
  assert_eq!(report.days, vec![CaseCount::new(at(8, 9, 0), 3)]);

  let month = sink.find_by_month("2021-08").await.unwrap();
  assert_eq!(month.len(), 1);
  assert_eq!(month[0].key(), "2021-08-09");
  assert_eq!(month[0].count, 3);
}

#[tokio::test]
async fn district_sync_enriches_through_locations() {
  let source = Arc::new(seeded().await);
  let sink = Arc::new(stats().await);

  let report = Synchronizer::new(source, sink.clone())
    .with_concurrency(3)
    .run("X", DateWindow::dates(aug(9), Some(aug(11))), SyncMode::ByDistrict)
    .await
    .unwrap();

  let breakdown: Vec<_> = report
    .districts
    .iter()
    .map(|c| (c.day(), c.district.unwrap(), c.count))
    .collect();
  assert_eq!(breakdown, vec![
    (aug(9), District::Cayo, 2),
    (aug(9), District::Toledo, 1),
    (aug(10), District::Toledo, 1),
    (aug(10), District::Unresolved, 1),
  ]);

  let counts: Vec<_> = sink
    .find_by_month("2021-08")
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.count)
    .collect();
  assert_eq!(counts, vec![3, 2]);
}

#[tokio::test]
async fn dangling_location_aborts_sync_without_writes() {
  let source = seeded().await;
  source
    .insert_persons(&[PersonRecord::confirmed(
      "X",
      Case::new("f", at(8, 9, 7)).with_residence("loc-gone"),
    )])
    .await
    .unwrap();
  let sink = Arc::new(stats().await);

  let err = Synchronizer::new(Arc::new(source), sink.clone())
    .run("X", DateWindow::dates(aug(9), None), SyncMode::ByDistrict)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Enrichment);
  assert!(sink.find_by_year(2021).await.unwrap().is_empty());
}
