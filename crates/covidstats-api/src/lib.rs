//! JSON read API for the COVID statistics service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`covidstats_core::store::StatsStore`]. Nothing is aggregated on read:
//! handlers filter by partition field and return the stored records.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", covidstats_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  http::{HeaderName, Method, header},
  routing::get,
};
use covidstats_core::store::StatsStore;
use tower_http::cors::{Any, CorsLayer};

pub use error::ApiError;

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: StatsStore + 'static,
{
  Router::new()
    .route("/byYear", get(stats::current_year::<S>))
    .route("/byYear/{year}", get(stats::by_year::<S>))
    .route("/byMonth/{month}", get(stats::by_month::<S>))
    .layer(cors())
    .with_state(store)
}

/// Browser clients may call from any origin; `OPTIONS` is answered by the
/// layer with an empty body.
fn cors() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::OPTIONS])
    .allow_headers([
      header::ACCEPT,
      header::CONTENT_TYPE,
      header::CONTENT_LENGTH,
      header::ACCEPT_ENCODING,
      header::AUTHORIZATION,
      header::REFERER,
      header::CONNECTION,
      HeaderName::from_static("x-csrf-token"),
      HeaderName::from_static("x-poe-authorization"),
    ])
}

// ─── Integration tests ────────────────────────────────────────────────────────
