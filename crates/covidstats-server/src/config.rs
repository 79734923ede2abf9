//! Runtime configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the optional TOML
//! file, `COVIDSTATS_*` environment variables, and finally a bare `PORT`
//! variable as set by container platforms.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use covidstats_core::{
  district::{DistrictCode, DistrictResolver},
  enrich::DEFAULT_CONCURRENCY,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  #[default]
  Text,
  Json,
}

/// Settings shared by `serve` and `sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_cases_store_path")]
  pub cases_store_path:       PathBuf,
  #[serde(default = "default_stats_store_path")]
  pub stats_store_path:       PathBuf,
  /// Required by `sync`; the API does not need it.
  #[serde(default)]
  pub outbreak_id:            Option<String>,
  #[serde(default = "default_concurrency")]
  pub enrichment_concurrency: usize,
  #[serde(default)]
  pub log_format:             LogFormat,
  /// How long `serve` keeps draining in-flight requests after Ctrl-C.
  #[serde(default = "default_shutdown_grace_secs")]
  pub shutdown_grace_secs:    u64,
  /// Replaces the built-in parent-location code table when set.
  #[serde(default)]
  pub districts:              Option<Vec<DistrictCode>>,
}

fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_cases_store_path() -> PathBuf { PathBuf::from("cases.db") }
fn default_stats_store_path() -> PathBuf { PathBuf::from("stats.db") }
fn default_concurrency() -> usize { DEFAULT_CONCURRENCY }
fn default_shutdown_grace_secs() -> u64 { 30 }

impl ServerConfig {
  /// Load from `path` (missing file is fine) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("COVIDSTATS"))
      .set_override_option("port", std::env::var("PORT").ok())
      .context("invalid PORT")?;
    Self::from_builder(builder)
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn resolver(&self) -> DistrictResolver {
    match &self.districts {
      Some(table) => DistrictResolver::new(table.iter().cloned()),
      None => DistrictResolver::default(),
    }
  }

  pub fn outbreak_id(&self) -> anyhow::Result<&str> {
    self
      .outbreak_id
      .as_deref()
      .map(str::trim)
      .filter(|id| !id.is_empty())
      .context("outbreak_id is not configured (set COVIDSTATS_OUTBREAK_ID)")
  }
}
