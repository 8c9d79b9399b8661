//! HTTP server for the campus resource engine.
//!
//! Mounts the [`campus_api`] router under `/api`, adds a health probe and
//! request tracing, and owns the server-side configuration and the reminder
//! hooks the API dispatches through.

pub mod notify;
pub mod sweep;

use std::{path::{Path, PathBuf}, sync::Arc};

use axum::{Router, routing::get};
use campus_core::{loan::CirculationPolicy, notify::Notifier, store::CampusStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, layered from `campus.toml` and `CAMPUS_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub policy:     CirculationPolicy,
  pub reminders:  ReminderConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("campus.db"),
      policy:     CirculationPolicy::default(),
      reminders:  ReminderConfig::default(),
    }
  }
}

/// Where overdue reminders go and how often the server sweeps for them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
  /// POST reminders here as JSON. Without it reminders are only logged.
  pub webhook_url:         Option<String>,
  /// Run the overdue sweep this often. Unset or zero disables it.
  pub sweep_interval_secs: Option<u64>,
  /// Remind the same loan again after this many hours. Unset reminds once.
  pub resend_after_hours:  Option<u64>,
}

impl ReminderConfig {
  pub fn sweep_interval(&self) -> Option<std::time::Duration> {
    self
      .sweep_interval_secs
      .filter(|secs| *secs > 0)
      .map(std::time::Duration::from_secs)
  }

  pub fn resend_after(&self) -> Option<chrono::Duration> {
    self
      .resend_after_hours
      .and_then(|hours| i64::try_from(hours).ok())
      .map(chrono::Duration::hours)
  }
}

/// The `CAMPUS_*` environment source. Nested keys use `__`, as in
/// `CAMPUS_REMINDERS__WEBHOOK_URL`.
pub fn environment() -> config::Environment {
  config::Environment::with_prefix("CAMPUS")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

/// Layer the optional file at `path` under `env`.
pub fn load_config(
  path: &Path,
  env: config::Environment,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()?
    .try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: `/healthz` plus the API under `/api`, traced.
pub fn app<S, N>(store: Arc<S>, notifier: Arc<N>) -> Router
where
  S: CampusStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", campus_api::api_router(store, notifier))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
