//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD` and timestamps as RFC 3339 UTC
//! strings, so SQLite's lexicographic text comparison matches chronological
//! order and the window filters can run directly in SQL.

use chrono::{DateTime, NaiveDate, Utc};
use lantern_core::record::{CaseRecord, DailyKey};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String {
  d.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `daily_keys` row.
pub struct RawDailyKey {
  pub key:        String,
  pub date:       String,
  pub is_tested:  bool,
  pub created_at: String,
}

impl RawDailyKey {
  pub fn into_daily_key(self) -> Result<DailyKey> {
    Ok(DailyKey {
      key:        self.key,
      date:       decode_date(&self.date)?,
      is_tested:  self.is_tested,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `cases` row.
pub struct RawCaseRecord {
  pub case_id:        String,
  pub symptoms_onset: String,
  pub is_tested:      bool,
  pub comment:        Option<String>,
  pub created_at:     String,
}

impl RawCaseRecord {
  pub fn into_case_record(self) -> Result<CaseRecord> {
    Ok(CaseRecord {
      case_id:        self.case_id,
      symptoms_onset: decode_date(&self.symptoms_onset)?,
      is_tested:      self.is_tested,
      comment:        self.comment,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}
