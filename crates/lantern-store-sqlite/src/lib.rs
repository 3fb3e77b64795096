//! SQLite backend for the Lantern record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The admission sequence (duplicate
//! check, rate-limit count, inserts) executes inside a single transaction on
//! that thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
