//! In-memory fakes of the store traits for unit tests.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use crate::{
  Error, Result,
  aggregate,
  case::{Case, DateWindow, Location},
  stats::{CaseCount, CasesCountByDate, daily_records},
  store::{CaseSource, StatsStore},
};

// ─── Source ──────────────────────────────────────────────────────────────────

/// Holds confirmed, non-deleted cases for a single outbreak.
pub struct FakeSource {
  outbreak_id:      String,
  cases:            Vec<Case>,
  locations:        HashMap<String, Location>,
  failing_location: Option<String>,
  failing_queries:  bool,
  in_flight:        AtomicUsize,
  peak_in_flight:   AtomicUsize,
}

impl FakeSource {
  pub fn new(outbreak_id: &str) -> Self {
    Self {
      outbreak_id:      outbreak_id.to_owned(),
      cases:            Vec::new(),
      locations:        HashMap::new(),
      failing_location: None,
      failing_queries:  false,
      in_flight:        AtomicUsize::new(0),
      peak_in_flight:   AtomicUsize::new(0),
    }
  }

  pub fn with_case(mut self, case: Case) -> Self {
    self.cases.push(case);
    self
  }

  pub fn with_location(mut self, id: &str, parent: Option<&str>) -> Self {
    self.locations.insert(id.to_owned(), Location {
      id:                 id.to_owned(),
      parent_location_id: parent.map(str::to_owned),
    });
    self
  }

  pub fn failing_location(mut self, id: &str) -> Self {
    self.failing_location = Some(id.to_owned());
    self
  }

  pub fn failing_queries(mut self) -> Self {
    self.failing_queries = true;
    self
  }

  /// Most location lookups that were ever running at the same time.
  pub fn peak_lookups(&self) -> usize { self.peak_in_flight.load(Ordering::SeqCst) }

  fn matching(&self, outbreak_id: &str, window: DateWindow) -> Result<Vec<Case>> {
    if self.failing_queries {
      return Err(Error::query("find cases", "source unavailable"));
    }
    if outbreak_id != self.outbreak_id {
      return Ok(Vec::new());
    }
    Ok(
      self
        .cases
        .iter()
        .filter(|c| window.contains(c.reporting_date))
        .cloned()
        .collect(),
    )
  }
}

impl CaseSource for FakeSource {
  async fn find_confirmed_cases(
    &self,
    outbreak_id: &str,
    window: DateWindow,
  ) -> Result<Vec<Case>> {
    self.matching(outbreak_id, window)
  }

  async fn group_cases_by_date(
    &self,
    outbreak_id: &str,
    window: DateWindow,
  ) -> Result<Vec<CaseCount>> {
    Ok(aggregate::by_date(&self.matching(outbreak_id, window)?))
  }

  async fn find_location_by_id(&self, id: &str) -> Result<Option<Location>> {
    let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
    // Suspend once so sibling lookups get polled while this one is open.
    tokio::task::yield_now().await;
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    if self.failing_location.as_deref() == Some(id) {
      return Err(Error::query(format!("find location {id}"), "timeout"));
    }
    Ok(self.locations.get(id).cloned())
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Keyed by document key, applying whole batches or nothing.
#[derive(Default)]
pub struct FakeStats {
  docs:    Mutex<BTreeMap<String, CasesCountByDate>>,
  failing: bool,
}

impl FakeStats {
  pub fn failing() -> Self { Self { failing: true, ..Self::default() } }

  pub fn snapshot(&self) -> BTreeMap<String, CasesCountByDate> {
    self.docs.lock().unwrap().clone()
  }
}

impl StatsStore for FakeStats {
  async fn save(&self, counts: &[CaseCount]) -> Result<()> {
    if self.failing {
      return Err(Error::sync("commit batch", "permission denied"));
    }
    let mut docs = self.docs.lock().unwrap();
    for record in daily_records(counts) {
      docs.insert(record.key(), record);
    }
    Ok(())
  }

  async fn find_by_year(&self, year: i32) -> Result<Vec<CasesCountByDate>> {
    let docs = self.docs.lock().unwrap();
    Ok(docs.values().filter(|d| d.year == year).cloned().collect())
  }

  async fn find_by_month(&self, month: &str) -> Result<Vec<CasesCountByDate>> {
    let docs = self.docs.lock().unwrap();
    Ok(docs.values().filter(|d| d.month == month).cloned().collect())
  }
}
