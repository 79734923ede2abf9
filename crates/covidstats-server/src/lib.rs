//! Process wiring for the `covidstats` binary: opening the stores, serving
//! the read API, and running one sync.

pub mod config;

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use axum::Router;
use chrono::NaiveDate;
use covidstats_core::{
  case::DateWindow,
  store::StatsStore,
  sync::{SyncMode, SyncReport, Synchronizer},
};
use covidstats_store_sqlite::{SqliteCaseStore, SqliteStatsStore};
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::trace::TraceLayer;

pub use config::{LogFormat, ServerConfig};

// ─── Serve ────────────────────────────────────────────────────────────────────

/// The full HTTP application: the API under `/api`, with request tracing.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: StatsStore + 'static,
{
  Router::new()
    .nest("/api", covidstats_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C, then drain in-flight requests for at most
/// `shutdown_grace_secs`.
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
  let store = SqliteStatsStore::open(&config.stats_store_path)
    .await
    .with_context(|| {
      format!("failed to open stats store at {:?}", config.stats_store_path)
    })?;

  let app = router(Arc::new(store));
  let address = format!("{}:{}", config.host, config.port);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  let grace = Duration::from_secs(config.shutdown_grace_secs);
  serve_until(listener, app, shutdown_signal(), grace).await?;

  tracing::info!("shutting down");
  Ok(())
}

/// Serve `app` until `signal` resolves. Connections still open `grace` after
/// the signal are abandoned.
pub async fn serve_until<F>(
  listener: TcpListener,
  app: Router,
  signal: F,
  grace: Duration,
) -> anyhow::Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
  let server = axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      signal.await;
      let _ = signalled_tx.send(());
    })
    .into_future();

  let deadline = async move {
    match signalled_rx.await {
      Ok(()) => tokio::time::sleep(grace).await,
      Err(_) => std::future::pending::<()>().await,
    }
  };

  tokio::select! {
    result = server => result.context("server error")?,
    () = deadline => {
      tracing::warn!(?grace, "in-flight requests did not drain in time; abandoning them");
    }
  }
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}

// ─── Sync ─────────────────────────────────────────────────────────────────────

/// Parameters of a single sync run.
#[derive(Debug, Clone)]
pub struct SyncRequest {
  pub date:        NaiveDate,
  /// Exclusive end; one day after `date` when omitted.
  pub until:       Option<NaiveDate>,
  pub by_district: bool,
  /// Upper bound on the whole run. A run cut short has written either its
  /// complete batch or nothing.
  pub timeout:     Option<Duration>,
}

/// Open both stores and run one sync for the configured outbreak.
pub async fn run_sync(config: &ServerConfig, request: &SyncRequest) -> anyhow::Result<SyncReport> {
  let outbreak_id = config.outbreak_id()?;

  let window = DateWindow::dates(request.date, request.until);
  anyhow::ensure!(
    !window.is_empty(),
    "--until ({:?}) must be after --date ({})",
    request.until,
    request.date
  );

  let source = SqliteCaseStore::open(&config.cases_store_path)
    .await
    .with_context(|| format!("failed to open case store at {:?}", config.cases_store_path))?;
  let stats = SqliteStatsStore::open(&config.stats_store_path)
    .await
    .with_context(|| {
      format!("failed to open stats store at {:?}", config.stats_store_path)
    })?;

  let synchronizer = Synchronizer::new(Arc::new(source), Arc::new(stats))
    .with_resolver(config.resolver())
    .with_concurrency(config.enrichment_concurrency);

  let mode = if request.by_district { SyncMode::ByDistrict } else { SyncMode::Grouped };
  let run = synchronizer.run(outbreak_id, window, mode);

  let report = match request.timeout {
    Some(limit) => tokio::time::timeout(limit, run)
      .await
      .map_err(|_| anyhow::anyhow!("sync timed out after {limit:?}"))??,
    None => run.await?,
  };
  Ok(report)
}
