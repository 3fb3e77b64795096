//! SQL schema for the Lantern SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The uniqueness constraints are the enforcement backstop for the duplicate
/// check: a violation racing past the application-level check is reported as
/// a duplicate, never as a fatal error.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Daily keys are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS daily_keys (
    key        TEXT NOT NULL,      -- opaque hex token
    date       TEXT NOT NULL,      -- ISO 8601 calendar date, UTC
    is_tested  INTEGER NOT NULL,
    created_at TEXT NOT NULL,      -- ISO 8601 UTC; server-assigned
    UNIQUE (key, date)
);

-- One active case per app installation; append-only.
CREATE TABLE IF NOT EXISTS cases (
    case_id        TEXT PRIMARY KEY,
    symptoms_onset TEXT NOT NULL,
    is_tested      INTEGER NOT NULL,
    comment        TEXT,
    created_at     TEXT NOT NULL
);

-- Submission attempts, used solely for throttling. Deliberately carries no
-- foreign key into daily_keys or cases: source addresses must never be
-- joinable with published records.
CREATE TABLE IF NOT EXISTS requests (
    request_id  INTEGER PRIMARY KEY,
    remote_addr TEXT NOT NULL,
    user_agent  TEXT,
    comment     TEXT,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS daily_keys_key_idx     ON daily_keys(key);
CREATE INDEX IF NOT EXISTS daily_keys_date_idx    ON daily_keys(date);
CREATE INDEX IF NOT EXISTS requests_addr_time_idx ON requests(remote_addr, created_at);

PRAGMA user_version = 1;
";
