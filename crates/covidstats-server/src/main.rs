//! `covidstats`: sync confirmed-case counts into the query store and serve
//! them over HTTP.
//!
//! # Usage
//!
//! ```text
//! covidstats serve
//! covidstats sync --date 2021-08-09
//! covidstats sync --date 2021-06-01 --until 2021-09-01 --by-district
//! ```
//!
//! Settings come from `covidstats.toml` (or `--config`) and `COVIDSTATS_*`
//! environment variables.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use covidstats_server::{LogFormat, ServerConfig, SyncRequest};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "COVID case statistics: sync job and read API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "covidstats.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the read API until interrupted.
  Serve,
  /// Count confirmed cases for a date range and merge them into the query
  /// store.
  Sync(SyncArgs),
}

#[derive(Args)]
struct SyncArgs {
  /// First reporting day to sync (UTC). Defaults to today.
  #[arg(long, value_name = "YYYY-MM-DD")]
  date: Option<NaiveDate>,

  /// Exclusive end day. Defaults to the day after `--date`.
  #[arg(long, value_name = "YYYY-MM-DD")]
  until: Option<NaiveDate>,

  /// Enrich cases with their district and report a per-district breakdown.
  #[arg(long)]
  by_district: bool,

  /// Abort the run after this many seconds.
  #[arg(long, value_name = "SECONDS")]
  timeout_secs: Option<u64>,

  /// Override the configured outbreak.
  #[arg(long)]
  outbreak: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let mut config = ServerConfig::load(&cli.config)?;
  init_tracing(config.log_format);

  match cli.command {
    Command::Serve => covidstats_server::serve(&config).await,
    Command::Sync(args) => {
      if let Some(outbreak) = args.outbreak {
        config.outbreak_id = Some(outbreak);
      }
      let request = SyncRequest {
        date:        args.date.unwrap_or_else(|| Utc::now().date_naive()),
        until:       args.until,
        by_district: args.by_district,
        timeout:     args.timeout_secs.map(Duration::from_secs),
      };
      let report = covidstats_server::run_sync(&config, &request).await?;
      let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
      println!("{json}");
      Ok(())
    }
  }
}

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  let builder = tracing_subscriber::fmt().with_env_filter(filter);
  match format {
    LogFormat::Text => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}
