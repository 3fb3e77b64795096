//! The window policy — pure, stateless computations deciding which submitted
//! dates are acceptable and which records are currently visible on the public
//! feed.
//!
//! Two submission schemes exist; both are parameterized by the same two
//! durations (incubation period and infectious tail) and selected once at
//! startup rather than living in parallel code paths.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike as _, Utc};
use serde::{Deserialize, Serialize};

/// Days before symptom onset during which a carrier may already be
/// infectious.
pub const INCUBATION_PERIOD: i64 = 5;

/// Days after onset until a carrier typically stops testing positive
/// (day-key scheme tail).
pub const SYMPTOMS_TO_VIRUS_NEGATIVE: i64 = 11;

/// Days after onset during which a case remains published (case-record
/// scheme tail).
pub const CONTAGIOUS_PERIOD: i64 = 14;

// ─── Scheme ──────────────────────────────────────────────────────────────────

/// Which submission scheme this deployment runs. Selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
  /// Anonymized per-day tokens; one batch covers a whole infection period.
  DailyKeys,
  /// A single app-issued case identifier per submission.
  CaseRecords,
}

// ─── Window policy ───────────────────────────────────────────────────────────

/// Exclusive date bounds for the daily-key feed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
  /// Keys must be dated strictly after this.
  pub after:  NaiveDate,
  /// Keys must be dated strictly before this.
  pub before: NaiveDate,
}

/// Visibility and admission windows, parameterized on the incubation period
/// and the infectious tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
  pub incubation_days: i64,
  pub tail_days:       i64,
}

impl WindowPolicy {
  pub fn for_scheme(scheme: Scheme) -> Self {
    match scheme {
      Scheme::DailyKeys => Self {
        incubation_days: INCUBATION_PERIOD,
        tail_days:       SYMPTOMS_TO_VIRUS_NEGATIVE,
      },
      Scheme::CaseRecords => Self {
        incubation_days: INCUBATION_PERIOD,
        tail_days:       CONTAGIOUS_PERIOD,
      },
    }
  }

  /// Length of a typical infection in days; also the number of daily keys a
  /// submission batch must contain.
  pub fn infection_period(&self) -> i64 {
    self.incubation_days + self.tail_days
  }

  /// The feed visibility window for daily keys. Both bounds are exclusive:
  /// keys older than a typical infection period are no longer a risk, and
  /// keys dated today or later are withheld so a submitter can never be
  /// identified through an immediately-visible key.
  pub fn active_window(&self, today: NaiveDate) -> DateWindow {
    DateWindow {
      after:  today - Duration::days(self.infection_period()),
      before: today,
    }
  }

  /// The published window of a single case, anchored on symptom onset and
  /// independent of when "now" is.
  pub fn case_window(&self, onset: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
      onset - Duration::days(self.incubation_days),
      onset + Duration::days(self.tail_days),
    )
  }
}

// ─── Release threshold ───────────────────────────────────────────────────────

/// The most recent of the two fixed daily release instants (00:00 and 12:00
/// UTC).
///
/// Keys created after the threshold are withheld from the current feed, so
/// new keys appear in twice-daily batches and an observer cannot correlate a
/// freshly submitted key with a specific submitting session. Day-key scheme
/// only.
pub fn release_threshold(now: DateTime<Utc>) -> DateTime<Utc> {
  let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
  if now.hour() >= 12 {
    midnight + Duration::hours(12)
  } else {
    midnight
  }
}

// ─── Throttle policy ─────────────────────────────────────────────────────────

/// Per-source submission throttling parameters.
///
/// A reasonable number of submissions from the same address within a short
/// period is legitimate: multiple cases can originate from the same household
/// or organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
  /// Submissions from one address are rejected once this many prior request
  /// rows fall within the trailing window.
  pub max_requests: u32,
  /// Trailing window length.
  pub window:       Duration,
}

impl ThrottlePolicy {
  pub fn for_scheme(scheme: Scheme) -> Self {
    match scheme {
      Scheme::DailyKeys => Self {
        max_requests: 5,
        window:       Duration::hours(1),
      },
      Scheme::CaseRecords => Self {
        max_requests: 5,
        window:       Duration::minutes(5),
      },
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    date(y, m, d)
      .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
      .and_utc()
  }

  #[test]
  fn day_key_policy_covers_sixteen_days() {
    let policy = WindowPolicy::for_scheme(Scheme::DailyKeys);
    assert_eq!(policy.infection_period(), 16);
  }

  #[test]
  fn active_window_bounds_are_exclusive() {
    let policy = WindowPolicy::for_scheme(Scheme::DailyKeys);
    let today  = date(2026, 8, 24);
    let window = policy.active_window(today);

    // A key dated exactly today - 16 sits on the exclusive lower bound and
    // is excluded; today - 15 is the oldest published date.
    assert_eq!(window.after, date(2026, 8, 8));
    assert!(date(2026, 8, 8) <= window.after);
    assert!(date(2026, 8, 9) > window.after);

    // Keys dated today or later are never published.
    assert_eq!(window.before, today);
    assert!(today >= window.before);
  }

  #[test]
  fn release_threshold_morning_is_midnight() {
    let threshold = release_threshold(utc(2026, 8, 24, 11, 59));
    assert_eq!(threshold, utc(2026, 8, 24, 0, 0));
  }

  #[test]
  fn release_threshold_afternoon_is_noon() {
    let threshold = release_threshold(utc(2026, 8, 24, 12, 1));
    assert_eq!(threshold, utc(2026, 8, 24, 12, 0));
  }

  #[test]
  fn release_threshold_flips_at_exactly_noon() {
    let threshold = release_threshold(utc(2026, 8, 24, 12, 0));
    assert_eq!(threshold, utc(2026, 8, 24, 12, 0));
  }

  #[test]
  fn key_created_before_noon_is_released_by_afternoon() {
    // Created at 00:01, queried at 12:00 the same day: released.
    let created = utc(2026, 8, 24, 0, 1);
    assert!(created <= release_threshold(utc(2026, 8, 24, 12, 0)));

    // Created at 11:59, queried at 12:01: also released, because 11:59 does
    // not exceed the 12:00 threshold.
    let created = utc(2026, 8, 24, 11, 59);
    assert!(created <= release_threshold(utc(2026, 8, 24, 12, 1)));

    // Created at 12:01, queried at 12:01: withheld until the next release.
    let created = utc(2026, 8, 24, 12, 1);
    assert!(created > release_threshold(utc(2026, 8, 24, 12, 1)));
  }

  #[test]
  fn case_window_is_anchored_on_onset() {
    let policy = WindowPolicy::for_scheme(Scheme::CaseRecords);
    let (begins_on, ends_on) = policy.case_window(date(2026, 8, 10));
    assert_eq!(begins_on, date(2026, 8, 5));
    assert_eq!(ends_on, date(2026, 8, 24));
  }

  #[test]
  fn throttle_windows_differ_per_scheme() {
    let keys  = ThrottlePolicy::for_scheme(Scheme::DailyKeys);
    let cases = ThrottlePolicy::for_scheme(Scheme::CaseRecords);
    assert_eq!(keys.window, Duration::hours(1));
    assert_eq!(cases.window, Duration::minutes(5));
    assert_eq!(keys.max_requests, 5);
    assert_eq!(cases.max_requests, 5);
  }
}
