//! [`SqliteStore`] — the SQLite implementation of [`ExposureStore`].

use std::path::Path;

use chrono::Utc;
use lantern_core::{
  record::{CaseRecord, DailyKey, NewCaseRecord, NewDailyKey, NewRequestLog},
  store::{Admission, ExposureStore, KeyWindow, Throttle},
};

use crate::{
  Error, Result,
  encode::{RawCaseRecord, RawDailyKey, encode_date, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lantern record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// run on the connection's dedicated thread, so a submission's transaction
/// can never interleave with another submission's.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    let n = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(conn.query_row(&sql, [], |r| r.get(0))?)
      })
      .await?;
    Ok(n)
  }
}

/// `UNIQUE` / `PRIMARY KEY` violations are duplicate submissions that raced
/// past the application-level check, not fatal errors. Other constraint
/// classes (CHECK, NOT NULL) stay store errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Count prior request-log rows from `remote_addr` within the trailing
/// window. Runs inside the submission transaction.
fn prior_requests(
  tx: &rusqlite::Transaction<'_>,
  remote_addr: &str,
  since: &str,
) -> rusqlite::Result<i64> {
  tx.query_row(
    "SELECT COUNT(*) FROM requests WHERE remote_addr = ?1 AND created_at >= ?2",
    rusqlite::params![remote_addr, since],
    |r| r.get(0),
  )
}

fn insert_request(
  tx: &rusqlite::Transaction<'_>,
  log: &NewRequestLog,
  created_at: &str,
) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT INTO requests (remote_addr, user_agent, comment, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![log.remote_addr, log.user_agent, log.comment, created_at],
  )?;
  Ok(())
}

// ─── ExposureStore impl ──────────────────────────────────────────────────────

impl ExposureStore for SqliteStore {
  type Error = Error;

  async fn submit_keys(
    &self,
    batch: Vec<NewDailyKey>,
    log: NewRequestLog,
    throttle: Throttle,
  ) -> Result<Admission> {
    let created_at = encode_dt(Utc::now());
    let since      = encode_dt(throttle.since);
    let max        = i64::from(throttle.max_requests);

    let values: Vec<String> = batch.iter().map(|k| k.key.clone()).collect();
    let rows: Vec<(String, String, bool)> = batch
      .into_iter()
      .map(|k| (k.key, encode_date(k.date), k.is_tested))
      .collect();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // 1. Duplicate rejection on key value alone; the (key, date)
        //    uniqueness constraint is the storage-layer backstop.
        let existing: i64 = if values.is_empty() {
          0
        } else {
          let placeholders = vec!["?"; values.len()].join(", ");
          let sql = format!(
            "SELECT COUNT(*) FROM daily_keys WHERE key IN ({placeholders})"
          );
          tx.query_row(&sql, rusqlite::params_from_iter(values.iter()), |r| {
            r.get(0)
          })?
        };
        if existing > 0 {
          return Ok(Admission::Duplicate);
        }

        // 2. Rate limiting over the trailing window.
        if prior_requests(&tx, &log.remote_addr, &since)? >= max {
          return Ok(Admission::RateLimited);
        }

        // 3. One row per key plus exactly one request row, atomically.
        for (key, date, is_tested) in &rows {
          let inserted = tx.execute(
            "INSERT INTO daily_keys (key, date, is_tested, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![key, date, is_tested, created_at],
          );
          if let Err(e) = inserted {
            if is_unique_violation(&e) {
              // Lost a race with a concurrent submission; the transaction
              // rolls back on drop, leaving no partial key set.
              return Ok(Admission::Duplicate);
            }
            return Err(e.into());
          }
        }

        insert_request(&tx, &log, &created_at)?;
        tx.commit()?;
        Ok(Admission::Committed)
      })
      .await?;

    Ok(outcome)
  }

  async fn submit_case(
    &self,
    case: NewCaseRecord,
    log: NewRequestLog,
    throttle: Throttle,
  ) -> Result<Admission> {
    let created_at = encode_dt(Utc::now());
    let since      = encode_dt(throttle.since);
    let max        = i64::from(throttle.max_requests);
    let onset      = encode_date(case.symptoms_onset);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Does not allow overriding an already reported case.
        let existing: i64 = tx.query_row(
          "SELECT COUNT(*) FROM cases WHERE case_id = ?1",
          rusqlite::params![case.case_id],
          |r| r.get(0),
        )?;
        if existing > 0 {
          return Ok(Admission::Duplicate);
        }

        if prior_requests(&tx, &log.remote_addr, &since)? >= max {
          return Ok(Admission::RateLimited);
        }

        let inserted = tx.execute(
          "INSERT INTO cases (case_id, symptoms_onset, is_tested, comment, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            case.case_id,
            onset,
            case.is_tested,
            case.comment,
            created_at
          ],
        );
        if let Err(e) = inserted {
          if is_unique_violation(&e) {
            return Ok(Admission::Duplicate);
          }
          return Err(e.into());
        }

        insert_request(&tx, &log, &created_at)?;
        tx.commit()?;
        Ok(Admission::Committed)
      })
      .await?;

    Ok(outcome)
  }

  async fn active_keys(&self, window: KeyWindow) -> Result<Vec<DailyKey>> {
    let after       = encode_date(window.after);
    let before      = encode_date(window.before);
    let released_by = encode_dt(window.released_by);

    let raws: Vec<RawDailyKey> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT key, date, is_tested, created_at
           FROM daily_keys
           WHERE date > ?1 AND date < ?2 AND created_at <= ?3
           ORDER BY key",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after, before, released_by], |row| {
            Ok(RawDailyKey {
              key:        row.get(0)?,
              date:       row.get(1)?,
              is_tested:  row.get(2)?,
              created_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailyKey::into_daily_key).collect()
  }

  async fn all_cases(&self) -> Result<Vec<CaseRecord>> {
    let raws: Vec<RawCaseRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT case_id, symptoms_onset, is_tested, comment, created_at
           FROM cases
           ORDER BY case_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCaseRecord {
              case_id:        row.get(0)?,
              symptoms_onset: row.get(1)?,
              is_tested:      row.get(2)?,
              comment:        row.get(3)?,
              created_at:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaseRecord::into_case_record).collect()
  }
}
