//! The feed builder — projects currently-active records into the public
//! response shape.
//!
//! For fixed store contents and a fixed `now` the output is identical and
//! order-stable: the store returns rows ordered by key value (or case id),
//! and the projection preserves that order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
  policy::{Scheme, WindowPolicy, release_threshold},
  store::{ExposureStore, KeyWindow},
};

// ─── Wire types ──────────────────────────────────────────────────────────────

/// Whether a published record stems from a lab-confirmed case or a
/// self-reported symptomatic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
  Positive,
  Symptomatic,
}

/// One published record. The wire shape depends on the configured scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PublicRecord {
  /// Day-key scheme: `{"key": ..., "date": ..., "type": ...}`.
  Key {
    key:  String,
    date: NaiveDate,
    #[serde(rename = "type")]
    kind: CaseKind,
  },
  /// Case scheme: the published window anchored on symptom onset.
  Case {
    id:        String,
    begins_on: NaiveDate,
    ends_on:   NaiveDate,
  },
}

/// The public feed document served at `/cases.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feed {
  pub cases: Vec<PublicRecord>,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the public feed for the configured scheme at instant `now`.
///
/// Day-key scheme: keys strictly inside the active window whose `created_at`
/// does not exceed the release threshold, ordered ascending by key value.
/// Case scheme: every case on record, unconditionally; the time filtering
/// already happened at admission via the fixed onset-anchored window.
pub async fn build_feed<S: ExposureStore>(
  store: &S,
  scheme: Scheme,
  policy: &WindowPolicy,
  now: DateTime<Utc>,
) -> Result<Feed, S::Error> {
  let cases = match scheme {
    Scheme::DailyKeys => {
      let window = policy.active_window(now.date_naive());
      let keys = store
        .active_keys(KeyWindow {
          after:       window.after,
          before:      window.before,
          released_by: release_threshold(now),
        })
        .await?;

      keys
        .into_iter()
        .map(|k| PublicRecord::Key {
          key:  k.key,
          date: k.date,
          kind: if k.is_tested { CaseKind::Positive } else { CaseKind::Symptomatic },
        })
        .collect()
    }

    Scheme::CaseRecords => {
      let records = store.all_cases().await?;

      records
        .into_iter()
        .map(|c| {
          let (begins_on, ends_on) = policy.case_window(c.symptoms_onset);
          PublicRecord::Case { id: c.case_id, begins_on, ends_on }
        })
        .collect()
    }
  };

  Ok(Feed { cases })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_record_wire_shape() {
    let record = PublicRecord::Key {
      key:  "ab".repeat(32),
      date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
      kind: CaseKind::Positive,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "key": "ab".repeat(32),
        "date": "2026-08-20",
        "type": "positive",
      })
    );
  }

  #[test]
  fn untested_key_serializes_as_symptomatic() {
    let record = PublicRecord::Key {
      key:  "cd".repeat(32),
      date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
      kind: CaseKind::Symptomatic,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["type"], "symptomatic");
  }

  #[test]
  fn case_record_wire_shape() {
    let record = PublicRecord::Case {
      id:        "a1b2c3d4".to_string(),
      begins_on: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
      ends_on:   NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "id": "a1b2c3d4",
        "begins_on": "2026-08-05",
        "ends_on": "2026-08-24",
      })
    );
  }
}
