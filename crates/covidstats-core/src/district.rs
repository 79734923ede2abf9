//! Districts and the parent-location code table that maps onto them.

use serde::{Deserialize, Serialize};

/// One of the six administrative districts, or `Unresolved` when a case's
/// location could not be placed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum District {
  Belize,
  Cayo,
  Corozal,
  OrangeWalk,
  StannCreek,
  Toledo,
  #[default]
  Unresolved,
}

impl District {
  pub const ALL: [District; 6] = [
    District::Belize,
    District::Cayo,
    District::Corozal,
    District::OrangeWalk,
    District::StannCreek,
    District::Toledo,
  ];

  /// Stable identifier used in storage and JSON.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Belize => "belize",
      Self::Cayo => "cayo",
      Self::Corozal => "corozal",
      Self::OrangeWalk => "orange_walk",
      Self::StannCreek => "stann_creek",
      Self::Toledo => "toledo",
      Self::Unresolved => "unresolved",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "belize" => Some(Self::Belize),
      "cayo" => Some(Self::Cayo),
      "corozal" => Some(Self::Corozal),
      "orange_walk" => Some(Self::OrangeWalk),
      "stann_creek" => Some(Self::StannCreek),
      "toledo" => Some(Self::Toledo),
      "unresolved" => Some(Self::Unresolved),
      _ => None,
    }
  }
}

impl std::fmt::Display for District {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A single row of the code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictCode {
  pub district: District,
  pub code:     String,
}

/// Built-in parent-location codes (ISO 3166-2:BZ subdivisions).
pub const DEFAULT_CODES: [(District, &str); 6] = [
  (District::Belize, "BZ-BZ"),
  (District::Cayo, "BZ-CY"),
  (District::Corozal, "BZ-CZL"),
  (District::OrangeWalk, "BZ-OW"),
  (District::StannCreek, "BZ-SC"),
  (District::Toledo, "BZ-TOL"),
];

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Maps a parent-location code to its district.
///
/// The table is fixed once the resolver is built. Lookups never fail: a code
/// that is not in the table resolves to [`District::Unresolved`].
#[derive(Debug, Clone)]
pub struct DistrictResolver {
  table: Vec<DistrictCode>,
}

impl DistrictResolver {
  pub fn new(table: impl IntoIterator<Item = DistrictCode>) -> Self {
    Self { table: table.into_iter().collect() }
  }

  pub fn resolve(&self, code: &str) -> District {
    let code = code.trim();
    self
      .table
      .iter()
      .find(|entry| entry.code == code)
      .map(|entry| entry.district)
      .unwrap_or_default()
  }

}

impl Default for DistrictResolver {
  fn default() -> Self {
    Self::new(DEFAULT_CODES.iter().map(|(district, code)| DistrictCode {
      district: *district,
      code:     (*code).to_owned(),
    }))
  }
}
