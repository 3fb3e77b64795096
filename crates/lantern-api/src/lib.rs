//! JSON HTTP API for the Lantern exposure-notification backend.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lantern_core::store::ExposureStore`]. The router is built for the scheme
//! configured at startup: the submission route of the other scheme does not
//! exist. TLS and reverse-proxy concerns are the caller's responsibility.

pub mod cases;
pub mod error;
pub mod notify;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use lantern_core::{
  policy::{Scheme, ThrottlePolicy, WindowPolicy},
  store::ExposureStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LANTERN_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// `daily-keys` or `case-records`.
  pub scheme:     Scheme,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ExposureStore> {
  pub store:    Arc<S>,
  pub scheme:   Scheme,
  pub policy:   WindowPolicy,
  pub throttle: ThrottlePolicy,
}

impl<S: ExposureStore> AppState<S> {
  /// Build state for `scheme`, deriving the window and throttle policies.
  pub fn new(store: Arc<S>, scheme: Scheme) -> Self {
    Self {
      store,
      scheme,
      policy: WindowPolicy::for_scheme(scheme),
      throttle: ThrottlePolicy::for_scheme(scheme),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the configured scheme.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ExposureStore + Clone + 'static,
{
  let routes = match state.scheme {
    Scheme::DailyKeys => Router::new()
      .route("/cases.json", get(cases::handler::<S>))
      .route("/notify", post(notify::daily_keys::<S>)),
    Scheme::CaseRecords => Router::new()
      .route("/cases.json", get(cases::handler::<S>))
      .route("/notify/{id}", post(notify::case::<S>)),
  };

  routes.layer(TraceLayer::new_for_http()).with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
