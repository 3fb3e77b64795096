//! Handlers for the submission endpoints.
//!
//! | Method | Path | Scheme | Outcome |
//! |--------|------|--------|---------|
//! | `POST` | `/notify` | day-key | 201, 400, 403, or 429 |
//! | `POST` | `/notify/{id}` | case | 201, 400, 403, or 429 |

use std::net::SocketAddr;

use axum::{
  Json,
  extract::{ConnectInfo, Path, State},
  http::{HeaderMap, StatusCode, header},
};
use chrono::{NaiveDate, Utc};
use lantern_core::{
  admission::{self, CaseSubmission, KeyBatch, Origin, SubmittedKey},
  store::ExposureStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Origin resolution ───────────────────────────────────────────────────────

/// Resolve the submitting origin: the first `X-Forwarded-For` entry when the
/// server sits behind a proxy, else the peer address.
pub fn resolve_origin(headers: &HeaderMap, peer: SocketAddr) -> Origin {
  let forwarded = headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty());

  let user_agent = headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);

  Origin {
    remote_addr: forwarded.unwrap_or_else(|| peer.ip().to_string()),
    user_agent,
  }
}

// ─── Day-key scheme ──────────────────────────────────────────────────────────

/// JSON body accepted by `POST /notify`.
#[derive(Debug, Deserialize)]
pub struct NotifyBody {
  #[serde(default)]
  pub is_tested: bool,
  pub comment:   Option<String>,
  pub keys:      Vec<KeyEntry>,
}

#[derive(Debug, Deserialize)]
pub struct KeyEntry {
  pub date:  NaiveDate,
  pub value: String,
}

/// `POST /notify` — returns 201 Created on commit.
pub async fn daily_keys<S>(
  State(state): State<AppState<S>>,
  ConnectInfo(peer): ConnectInfo<SocketAddr>,
  headers: HeaderMap,
  Json(body): Json<NotifyBody>,
) -> Result<StatusCode, ApiError>
where
  S: ExposureStore + Clone + 'static,
{
  let origin = resolve_origin(&headers, peer);
  let count  = body.keys.len();

  let batch = KeyBatch {
    is_tested: body.is_tested,
    comment:   body.comment,
    keys:      body
      .keys
      .into_iter()
      .map(|k| SubmittedKey { date: k.date, value: k.value })
      .collect(),
  };

  admission::submit_daily_keys(
    state.store.as_ref(),
    &state.policy,
    &state.throttle,
    batch,
    origin,
    Utc::now(),
  )
  .await?;

  // Never log addresses or key material here.
  tracing::info!(count, "daily-key batch accepted");
  Ok(StatusCode::CREATED)
}

// ─── Case scheme ─────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /notify/{id}`.
#[derive(Debug, Deserialize)]
pub struct CaseBody {
  pub symptoms_onset: NaiveDate,
  #[serde(default)]
  pub is_tested:      bool,
  pub comment:        Option<String>,
}

/// `POST /notify/{id}` — returns 201 Created on commit.
pub async fn case<S>(
  State(state): State<AppState<S>>,
  ConnectInfo(peer): ConnectInfo<SocketAddr>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(body): Json<CaseBody>,
) -> Result<StatusCode, ApiError>
where
  S: ExposureStore + Clone + 'static,
{
  let origin = resolve_origin(&headers, peer);

  let submission = CaseSubmission {
    case_id:        id,
    symptoms_onset: body.symptoms_onset,
    is_tested:      body.is_tested,
    comment:        body.comment,
  };

  admission::submit_case(
    state.store.as_ref(),
    &state.throttle,
    submission,
    origin,
    Utc::now(),
  )
  .await?;

  tracing::info!("case accepted");
  Ok(StatusCode::CREATED)
}
