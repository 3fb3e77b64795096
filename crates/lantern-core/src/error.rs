//! Error types for `lantern-core`.

use thiserror::Error;

/// A submission that failed structural validation.
///
/// Always a client error: surfaced as `400 Bad Request` and never retried
/// automatically. Validation fails the whole submission; there is no partial
/// commit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("should contain {expected} daily keys, got {got}")]
  WrongKeyCount { expected: usize, got: usize },

  #[error("daily key values must be unique within a batch")]
  RepeatedKeyValue,

  #[error("daily key value must be {expected} lowercase hexadecimal characters")]
  MalformedKeyValue { expected: usize },

  #[error("key dates should not contain gaps")]
  DateGap,

  #[error("key dates can not all be in the future")]
  FutureBatch,

  #[error("case id must be {expected} alphanumeric characters")]
  MalformedCaseId { expected: usize },

  #[error("symptoms onset can not be in the future")]
  FutureOnset,

  #[error("comment must not exceed {max} characters")]
  CommentTooLong { max: usize },
}

/// Terminal outcome of a rejected submission. Nothing is ever retried
/// internally; every rejection is surfaced verbatim to the caller.
#[derive(Debug, Error)]
pub enum Rejection {
  /// Malformed, incomplete, or inconsistent submission (`400`).
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// A submitted key value or case id is already on record (`403`). The
  /// client must not retry with the same data.
  #[error("already reported")]
  Duplicate,

  /// Too many submissions from the same source address (`429`). The client
  /// may retry once the trailing window has elapsed.
  #[error("too many requests")]
  RateLimited,

  /// The store failed; surfaced as a generic server error (`500`).
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
