//! Error types for `covidstats-core`.
//!
//! Every store backend reports failures through this one enum so callers can
//! branch on the category without knowing which driver produced it.

use thiserror::Error;

/// The boxed underlying cause carried by every variant.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  /// A store could not be opened, reached, or authenticated against.
  #[error("failed to connect to {store}: {reason}")]
  Connection {
    store:  &'static str,
    reason: String,
    #[source]
    source: BoxError,
  },

  /// A filter, aggregation or lookup call failed at the store layer.
  #[error("query failed: {reason}")]
  Query {
    reason: String,
    #[source]
    source: BoxError,
  },

  /// A per-case location lookup failed; the whole enrichment batch is
  /// abandoned.
  #[error("failed to enrich case {case_id}: {reason}")]
  Enrichment {
    case_id: String,
    reason:  String,
    #[source]
    source:  Option<BoxError>,
  },

  /// A persistence batch failed to commit. Nothing in the batch counts as
  /// written.
  #[error("failed to save case counts: {reason}")]
  Sync {
    reason: String,
    #[source]
    source: BoxError,
  },
}

/// The category of an [`Error`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Connection,
  Query,
  Enrichment,
  Sync,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Connection { .. } => ErrorKind::Connection,
      Self::Query { .. } => ErrorKind::Query,
      Self::Enrichment { .. } => ErrorKind::Enrichment,
      Self::Sync { .. } => ErrorKind::Sync,
    }
  }

  pub fn query(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self::Query { reason: reason.into(), source: source.into() }
  }

  pub fn sync(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self::Sync { reason: reason.into(), source: source.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_matches_variant() {
    let err = Error::query("find cases", "boom");
    assert_eq!(err.kind(), ErrorKind::Query);

    let err = Error::sync("commit", "boom");
    assert_eq!(err.kind(), ErrorKind::Sync);

    let err = Error::Enrichment {
      case_id: "c1".into(),
      reason:  "location missing".into(),
      source:  None,
    };
    assert_eq!(err.kind(), ErrorKind::Enrichment);
  }

  #[test]
  fn display_keeps_operation_context() {
    let err = Error::query("find confirmed cases for outbreak x", "disk I/O error");
    let msg = err.to_string();
    assert!(msg.contains("outbreak x"), "{msg}");
    let source = std::error::Error::source(&err).unwrap().to_string();
    assert_eq!(source, "disk I/O error");
  }
}
