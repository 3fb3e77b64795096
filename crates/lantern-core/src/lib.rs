//! Core types and logic for the Lantern exposure-notification backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing heavier than
//! `chrono` and `serde`.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod admission;
pub mod error;
pub mod feed;
pub mod policy;
pub mod record;
pub mod store;

pub use error::{Rejection, ValidationError};
