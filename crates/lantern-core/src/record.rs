//! Record types — the append-only units of the Lantern store.
//!
//! A record is written exactly once per successful submission and never
//! updated or deleted by the application. Publication is controlled purely by
//! read-time filtering, not by mutation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Size of a daily key value, in bytes.
pub const DAILY_KEY_SIZE: usize = 32;

/// Length of a daily key value as a hex string.
pub const DAILY_KEY_HEX_LEN: usize = DAILY_KEY_SIZE * 2;

/// Length of an app-issued case identifier.
pub const CASE_ID_LEN: usize = 8;

/// Upper bound on free-text comments.
pub const MAX_COMMENT_LEN: usize = 1000;

// ─── Daily keys ──────────────────────────────────────────────────────────────

/// One day of anonymized contagion-relevant data (day-key scheme).
///
/// Unique per `(key, date)` pair at the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyKey {
  /// Opaque hex token, exactly [`DAILY_KEY_HEX_LEN`] characters.
  pub key:        String,
  /// Calendar date the key covers, UTC-normalized, no time component.
  pub date:       NaiveDate,
  /// Lab-confirmed case rather than a self-reported symptomatic one.
  pub is_tested:  bool,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
}

/// Input to [`ExposureStore::submit_keys`](crate::store::ExposureStore::submit_keys).
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewDailyKey {
  pub key:       String,
  pub date:      NaiveDate,
  pub is_tested: bool,
}

// ─── Case records ────────────────────────────────────────────────────────────

/// A reported case (case-record scheme). One active case per app
/// installation: unique per `case_id` at the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
  /// App-issued identifier, exactly [`CASE_ID_LEN`] alphanumeric characters.
  pub case_id:        String,
  pub symptoms_onset: NaiveDate,
  pub is_tested:      bool,
  pub comment:        Option<String>,
  /// Server-assigned; never changes after creation.
  pub created_at:     DateTime<Utc>,
}

/// Input to [`ExposureStore::submit_case`](crate::store::ExposureStore::submit_case).
#[derive(Debug, Clone)]
pub struct NewCaseRecord {
  pub case_id:        String,
  pub symptoms_onset: NaiveDate,
  pub is_tested:      bool,
  pub comment:        Option<String>,
}

// ─── Request log ─────────────────────────────────────────────────────────────

/// One accepted submission attempt, used solely for throttling.
///
/// Kept in a table of its own, with no foreign key into the record tables:
/// source-address metadata must never be joinable with published case data.
/// This is a privacy invariant, not just a schema choice.
#[derive(Debug, Clone)]
pub struct NewRequestLog {
  /// Resolved source address of the submitting client.
  pub remote_addr: String,
  pub user_agent:  Option<String>,
  pub comment:     Option<String>,
}
