//! vigil-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, starts the stillness sweep, and serves the JSON
//! API over HTTP. `VIGIL_`-prefixed environment variables override file
//! settings.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_engine::{Engine, EngineConfig, StillnessSweep, sink::TracingSink};
use vigil_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vigil presence & missing-detection server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  #[serde(default = "defaults::host")]
  host:       String,
  #[serde(default = "defaults::port")]
  port:       u16,
  #[serde(default = "defaults::store_path")]
  store_path: PathBuf,

  /// Seconds between stillness sweep passes.
  #[serde(default = "defaults::sweep_period_secs")]
  sweep_period_secs:           u64,
  /// Seconds a ward must sit still outside the geofence before a missing
  /// case opens.
  #[serde(default = "defaults::stillness_threshold_secs")]
  stillness_threshold_secs:    i64,
  /// Throttle interval seeded into newly created presence state.
  #[serde(default = "defaults::default_alert_interval_secs")]
  default_alert_interval_secs: i64,
}

mod defaults {
  use std::path::PathBuf;

  pub fn host() -> String { "127.0.0.1".to_string() }
  pub fn port() -> u16 { 5380 }
  pub fn store_path() -> PathBuf { PathBuf::from("vigil.db") }
  pub fn sweep_period_secs() -> u64 { 300 }
  pub fn stillness_threshold_secs() -> i64 { 3600 }
  pub fn default_alert_interval_secs() -> i64 { 10 }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VIGIL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = Engine::new(
    Arc::new(store),
    Arc::new(TracingSink),
    EngineConfig {
      default_alert_interval_secs: server_cfg.default_alert_interval_secs,
      stillness_threshold_secs:    server_cfg.stillness_threshold_secs,
      sweep_period:                Duration::from_secs(server_cfg.sweep_period_secs),
    },
  );

  // Start the stillness sweep; it stops when the shutdown flag flips.
  let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
  let sweep = tokio::spawn(StillnessSweep::new(engine.clone()).run(shutdown_rx));

  let app = vigil_api::api_router(engine).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
      }
    })
    .await
    .context("server error")?;

  let _ = shutdown_tx.send(true);
  sweep.await.context("sweep task panicked")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
