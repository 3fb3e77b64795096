//! The `ExposureStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `lantern-store-sqlite`).
//! Higher layers (`lantern-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};

use crate::record::{CaseRecord, DailyKey, NewCaseRecord, NewDailyKey, NewRequestLog};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Store-side throttling parameters, precomputed by the admission controller.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
  /// Count request-log rows created at or after this instant.
  pub since:        DateTime<Utc>,
  /// Reject once the prior count reaches this many.
  pub max_requests: u32,
}

/// Feed query bounds for daily keys, computed by the feed builder from the
/// window policy.
#[derive(Debug, Clone, Copy)]
pub struct KeyWindow {
  /// Exclusive lower date bound.
  pub after:       NaiveDate,
  /// Exclusive upper date bound.
  pub before:      NaiveDate,
  /// Inclusive upper bound on `created_at` (the release threshold).
  pub released_by: DateTime<Utc>,
}

/// Outcome of the transactional admission steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
  /// Every record row plus exactly one request-log row is committed.
  Committed,
  /// A submitted key value or case id is already on record; nothing was
  /// inserted. A unique-constraint violation racing past the duplicate check
  /// also lands here, never as a store error.
  Duplicate,
  /// The source address exhausted its trailing window; nothing was inserted.
  RateLimited,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Lantern record store backend.
///
/// All writes are append-only: records and request-log rows are created
/// exactly once and never mutated or deleted. The duplicate check, the
/// rate-limit count, and the inserts of a submission run inside a single
/// transaction, so a crash mid-batch can never leave a partial key set.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ExposureStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run the anti-abuse checks for a daily-key batch and, if both pass,
  /// insert one row per key plus one request-log row. Check order matters:
  /// duplicates are reported before the rate limit.
  fn submit_keys(
    &self,
    batch: Vec<NewDailyKey>,
    log: NewRequestLog,
    throttle: Throttle,
  ) -> impl Future<Output = Result<Admission, Self::Error>> + Send + '_;

  /// Case-scheme counterpart of [`submit_keys`](Self::submit_keys): one case
  /// row plus one request-log row.
  fn submit_case(
    &self,
    case: NewCaseRecord,
    log: NewRequestLog,
    throttle: Throttle,
  ) -> impl Future<Output = Result<Admission, Self::Error>> + Send + '_;

  /// Daily keys currently inside `window`, ordered ascending by key value —
  /// not by date, so response ordering leaks no temporal submission
  /// clustering.
  fn active_keys(
    &self,
    window: KeyWindow,
  ) -> impl Future<Output = Result<Vec<DailyKey>, Self::Error>> + Send + '_;

  /// Every case on record, ordered ascending by case id.
  fn all_cases(
    &self,
  ) -> impl Future<Output = Result<Vec<CaseRecord>, Self::Error>> + Send + '_;
}
