//! Handler for `GET /cases.json` — the public feed.

use axum::{Json, extract::State};
use chrono::Utc;
use lantern_core::{feed, feed::Feed, store::ExposureStore};

use crate::{AppState, error::ApiError};

/// `GET /cases.json`
///
/// Returns the currently-active records as `{"cases": [...]}`. The shape of
/// each entry depends on the configured scheme.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Feed>, ApiError>
where
  S: ExposureStore + Clone + 'static,
{
  let feed =
    feed::build_feed(state.store.as_ref(), state.scheme, &state.policy, Utc::now())
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(feed))
}
