//! campus-server binary.
//!
//! Reads `campus.toml` (or the path given with `--config`) layered under
//! `CAMPUS_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP. When `reminders.sweep_interval_secs` is set, overdue
//! reminders are also swept on a timer.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use campus_server::{environment, load_config, notify::ReminderHook, sweep};
use campus_store_sqlite::SqliteStore;
use chrono::Utc;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Campus resource allocation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "campus.toml")]
  config: PathBuf,

  /// Run one overdue-reminder sweep and exit instead of serving.
  #[arg(long)]
  sweep_once: bool,
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

  let server_cfg = load_config(&cli.config, environment())
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_policy(server_cfg.policy.clone());
  let store = Arc::new(store);

  let notifier = ReminderHook::from_config(&server_cfg.reminders)
    .context("failed to build reminder hook")?;
  let notifier = Arc::new(notifier);

  if cli.sweep_once {
    let sent = campus_api::remind::sweep_overdue(
      &*store,
      &*notifier,
      Utc::now(),
      server_cfg.reminders.resend_after(),
    )
    .await
    .context("overdue sweep failed")?;
    println!("{sent} reminder(s) sent");
    return Ok(());
  }

  if let Some(every) = server_cfg.reminders.sweep_interval() {
    tracing::info!(every_secs = every.as_secs(), "overdue sweep enabled");
    sweep::spawn(
      store.clone(),
      notifier.clone(),
      every,
      server_cfg.reminders.resend_after(),
    );
  }

  let app = campus_server::app(store, notifier);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

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
