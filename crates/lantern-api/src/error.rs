//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lantern_core::error::Rejection;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Structural validation failure; never retried automatically.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Duplicate submission; terminal for this data.
  #[error("already reported")]
  AlreadyReported,

  /// Per-source rate limit breached; the client may retry after the window.
  #[error("too many requests")]
  TooManyRequests,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<Rejection> for ApiError {
  fn from(rejection: Rejection) -> Self {
    match rejection {
      Rejection::Validation(e) => ApiError::BadRequest(e.to_string()),
      Rejection::Duplicate => ApiError::AlreadyReported,
      Rejection::RateLimited => ApiError::TooManyRequests,
      Rejection::Store(e) => ApiError::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::AlreadyReported => (StatusCode::FORBIDDEN, self.to_string()),
      ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
