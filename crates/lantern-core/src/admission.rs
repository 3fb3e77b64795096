//! The admission controller — structural validation and the anti-abuse gate
//! in front of the store.
//!
//! Per submission: `Received → StructurallyValid | StructuralReject →
//! (DuplicateReject | RateLimitReject | Committed)`. A rejection is terminal;
//! the client must resubmit explicitly.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{
  error::{Rejection, ValidationError},
  policy::{ThrottlePolicy, WindowPolicy},
  record::{
    CASE_ID_LEN, DAILY_KEY_HEX_LEN, MAX_COMMENT_LEN, NewCaseRecord, NewDailyKey,
    NewRequestLog,
  },
  store::{Admission, ExposureStore, Throttle},
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// A structurally unvalidated daily-key submission.
#[derive(Debug, Clone)]
pub struct KeyBatch {
  pub is_tested: bool,
  pub comment:   Option<String>,
  pub keys:      Vec<SubmittedKey>,
}

/// One key of a [`KeyBatch`].
#[derive(Debug, Clone)]
pub struct SubmittedKey {
  pub date:  NaiveDate,
  pub value: String,
}

/// A structurally unvalidated case submission.
#[derive(Debug, Clone)]
pub struct CaseSubmission {
  pub case_id:        String,
  pub symptoms_onset: NaiveDate,
  pub is_tested:      bool,
  pub comment:        Option<String>,
}

/// Who is submitting: the resolved source address plus the client's
/// user agent.
#[derive(Debug, Clone)]
pub struct Origin {
  pub remote_addr: String,
  pub user_agent:  Option<String>,
}

/// Marker for a committed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted;

// ─── Structural validation ───────────────────────────────────────────────────

fn check_comment(comment: Option<&str>) -> Result<(), ValidationError> {
  match comment {
    Some(c) if c.chars().count() > MAX_COMMENT_LEN => {
      Err(ValidationError::CommentTooLong { max: MAX_COMMENT_LEN })
    }
    _ => Ok(()),
  }
}

// Lowercase only: duplicate detection compares key values as strings, so a
// recased copy of a stored key must not read as a distinct value.
fn is_hex_key(value: &str) -> bool {
  value.len() == DAILY_KEY_HEX_LEN
    && !value.bytes().any(|b| b.is_ascii_uppercase())
    && hex::decode(value).is_ok()
}

/// Validate a daily-key batch against the structural rules: completeness,
/// well-formed key values, pairwise-distinct values, gap-free consecutive
/// dates, and the future-date rule.
pub fn validate_key_batch(
  policy: &WindowPolicy,
  batch: &KeyBatch,
  today: NaiveDate,
) -> Result<(), ValidationError> {
  check_comment(batch.comment.as_deref())?;

  let expected = policy.infection_period() as usize;
  if batch.keys.len() != expected {
    return Err(ValidationError::WrongKeyCount { expected, got: batch.keys.len() });
  }

  for key in &batch.keys {
    if !is_hex_key(&key.value) {
      return Err(ValidationError::MalformedKeyValue { expected: DAILY_KEY_HEX_LEN });
    }
  }

  let distinct: HashSet<&str> =
    batch.keys.iter().map(|k| k.value.as_str()).collect();
  if distinct.len() != expected {
    return Err(ValidationError::RepeatedKeyValue);
  }

  let mut dates: Vec<NaiveDate> = batch.keys.iter().map(|k| k.date).collect();
  dates.sort_unstable();
  for pair in dates.windows(2) {
    if pair[1] != pair[0] + Duration::days(1) {
      return Err(ValidationError::DateGap);
    }
  }

  // Only the earliest date matters: a contiguous run may legitimately cover
  // days that have not elapsed yet, as long as the batch does not lie
  // entirely in the future.
  if let Some(first) = dates.first()
    && *first > today
  {
    return Err(ValidationError::FutureBatch);
  }

  Ok(())
}

/// Validate a case submission: identifier format, non-future onset, and the
/// comment bound.
pub fn validate_case(
  submission: &CaseSubmission,
  today: NaiveDate,
) -> Result<(), ValidationError> {
  check_comment(submission.comment.as_deref())?;

  let id = &submission.case_id;
  if id.len() != CASE_ID_LEN || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
    return Err(ValidationError::MalformedCaseId { expected: CASE_ID_LEN });
  }

  if submission.symptoms_onset > today {
    return Err(ValidationError::FutureOnset);
  }

  Ok(())
}

// ─── Submission ──────────────────────────────────────────────────────────────

fn throttle_at(policy: &ThrottlePolicy, now: DateTime<Utc>) -> Throttle {
  Throttle {
    since:        now - policy.window,
    max_requests: policy.max_requests,
  }
}

fn map_outcome(outcome: Admission) -> Result<Accepted, Rejection> {
  match outcome {
    Admission::Committed => Ok(Accepted),
    Admission::Duplicate => Err(Rejection::Duplicate),
    Admission::RateLimited => Err(Rejection::RateLimited),
  }
}

/// Admit a daily-key batch: structural validation, then the store's
/// transactional duplicate check, rate-limit count, and commit.
pub async fn submit_daily_keys<S: ExposureStore>(
  store: &S,
  policy: &WindowPolicy,
  throttle: &ThrottlePolicy,
  batch: KeyBatch,
  origin: Origin,
  now: DateTime<Utc>,
) -> Result<Accepted, Rejection> {
  validate_key_batch(policy, &batch, now.date_naive())?;

  let is_tested = batch.is_tested;
  let records: Vec<NewDailyKey> = batch
    .keys
    .into_iter()
    .map(|k| NewDailyKey { key: k.value, date: k.date, is_tested })
    .collect();

  let log = NewRequestLog {
    remote_addr: origin.remote_addr,
    user_agent:  origin.user_agent,
    comment:     batch.comment,
  };

  let outcome = store
    .submit_keys(records, log, throttle_at(throttle, now))
    .await
    .map_err(|e| Rejection::Store(Box::new(e)))?;

  map_outcome(outcome)
}

/// Admit a case submission; the case-scheme counterpart of
/// [`submit_daily_keys`].
pub async fn submit_case<S: ExposureStore>(
  store: &S,
  throttle: &ThrottlePolicy,
  submission: CaseSubmission,
  origin: Origin,
  now: DateTime<Utc>,
) -> Result<Accepted, Rejection> {
  validate_case(&submission, now.date_naive())?;

  let record = NewCaseRecord {
    case_id:        submission.case_id,
    symptoms_onset: submission.symptoms_onset,
    is_tested:      submission.is_tested,
    comment:        submission.comment.clone(),
  };

  let log = NewRequestLog {
    remote_addr: origin.remote_addr,
    user_agent:  origin.user_agent,
    comment:     submission.comment,
  };

  let outcome = store
    .submit_case(record, log, throttle_at(throttle, now))
    .await
    .map_err(|e| Rejection::Store(Box::new(e)))?;

  map_outcome(outcome)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::policy::Scheme;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn policy() -> WindowPolicy {
    WindowPolicy::for_scheme(Scheme::DailyKeys)
  }

  /// A 64-char hex value, distinct per `i`.
  fn key_value(i: usize) -> String {
    format!("{i:04x}").repeat(16)
  }

  /// A valid contiguous batch whose last key is dated `last`.
  fn batch_ending(last: NaiveDate) -> KeyBatch {
    let days = policy().infection_period();
    KeyBatch {
      is_tested: true,
      comment:   None,
      keys:      (0..days)
        .map(|i| SubmittedKey {
          date:  last - Duration::days(days - 1 - i),
          value: key_value(i as usize),
        })
        .collect(),
    }
  }

  fn today() -> NaiveDate {
    date(2026, 8, 24)
  }

  #[test]
  fn valid_batch_passes() {
    assert_eq!(validate_key_batch(&policy(), &batch_ending(today()), today()), Ok(()));
  }

  #[test]
  fn wrong_key_count_is_rejected() {
    let mut batch = batch_ending(today());
    batch.keys.pop();
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::WrongKeyCount { expected: 16, got: 15 })
    );
  }

  #[test]
  fn repeated_key_value_is_rejected() {
    let mut batch = batch_ending(today());
    batch.keys[1].value = batch.keys[0].value.clone();
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::RepeatedKeyValue)
    );
  }

  #[test]
  fn short_key_value_is_rejected() {
    let mut batch = batch_ending(today());
    batch.keys[3].value = "abcd".to_string();
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::MalformedKeyValue { expected: 64 })
    );
  }

  #[test]
  fn non_hex_key_value_is_rejected() {
    let mut batch = batch_ending(today());
    batch.keys[3].value = "zz".repeat(32);
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::MalformedKeyValue { expected: 64 })
    );
  }

  #[test]
  fn uppercase_key_value_is_rejected() {
    let mut batch = batch_ending(today());
    batch.keys[3].value = batch.keys[3].value.to_uppercase();
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::MalformedKeyValue { expected: 64 })
    );
  }

  #[test]
  fn date_gap_is_rejected() {
    // Days 1,2,4,...: skipping one day anywhere fails the whole batch.
    let mut batch = batch_ending(today());
    batch.keys[2].date = batch.keys[2].date - Duration::days(1);
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::DateGap)
    );
  }

  #[test]
  fn entirely_future_batch_is_rejected() {
    // Earliest date strictly after today.
    let batch = batch_ending(today() + Duration::days(16));
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::FutureBatch)
    );
  }

  #[test]
  fn partially_future_batch_is_accepted() {
    // Latest date in the future but earliest on today: the min-date-only
    // rule admits it, covering not-yet-elapsed days of an incubation run.
    let batch = batch_ending(today() + Duration::days(15));
    assert_eq!(validate_key_batch(&policy(), &batch, today()), Ok(()));
  }

  #[test]
  fn min_date_boundary_is_strict() {
    // Earliest date exactly today is still acceptable.
    let batch = batch_ending(today() + Duration::days(15));
    assert_eq!(batch.keys[0].date, today());
    assert_eq!(validate_key_batch(&policy(), &batch, today()), Ok(()));

    let batch = batch_ending(today() + Duration::days(16));
    assert_eq!(batch.keys[0].date, today() + Duration::days(1));
    assert!(validate_key_batch(&policy(), &batch, today()).is_err());
  }

  #[test]
  fn oversized_comment_is_rejected() {
    let mut batch = batch_ending(today());
    batch.comment = Some("x".repeat(1001));
    assert_eq!(
      validate_key_batch(&policy(), &batch, today()),
      Err(ValidationError::CommentTooLong { max: 1000 })
    );
  }

  #[test]
  fn case_submission_rules() {
    let submission = CaseSubmission {
      case_id:        "a1b2c3d4".to_string(),
      symptoms_onset: today(),
      is_tested:      true,
      comment:        None,
    };
    assert_eq!(validate_case(&submission, today()), Ok(()));

    let bad_id = CaseSubmission { case_id: "a1b2".to_string(), ..submission.clone() };
    assert_eq!(
      validate_case(&bad_id, today()),
      Err(ValidationError::MalformedCaseId { expected: 8 })
    );

    let symbols = CaseSubmission { case_id: "a1b2c3d!".to_string(), ..submission.clone() };
    assert_eq!(
      validate_case(&symbols, today()),
      Err(ValidationError::MalformedCaseId { expected: 8 })
    );

    let future = CaseSubmission {
      symptoms_onset: today() + Duration::days(1),
      ..submission
    };
    assert_eq!(validate_case(&future, today()), Err(ValidationError::FutureOnset));
  }
}
