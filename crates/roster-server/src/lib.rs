//! HTTP server wiring for Roster: configuration and the top-level router.
//!
//! The JSON API itself lives in `roster-api`; this crate adds request
//! tracing and the settings the binary needs to open a store and bind.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use config::{Config, ConfigError, builder::DefaultState};
use roster_core::{Roster, store::EntityStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix of the environment variables that override file settings,
/// e.g. `ROSTER_PORT=9000`.
pub const ENV_PREFIX: &str = "ROSTER";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          8080,
      database_path: PathBuf::from("roster.db"),
    }
  }
}

impl ServerConfig {
  /// Load from an optional TOML file at `path`, overridden by `ROSTER_*`
  /// environment variables.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      Config::builder().add_source(config::File::from(path).required(false)),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<DefaultState>,
  ) -> Result<Self, ConfigError> {
    builder
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's [`Router`]: the JSON API with request tracing.
pub fn router<S: EntityStore>(roster: Arc<Roster<S>>) -> Router {
  Router::new()
    .merge(roster_api::api_router(roster))
    .layer(TraceLayer::new_for_http())
}
