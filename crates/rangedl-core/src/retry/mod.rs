//! Retry and backoff policy.
//!
//! Classifies block transfer failures (timeouts, throttling, connection
//! failures) and decides exponential backoff so the scheduler can release a
//! failed block and either reclaim it later in the same run or leave it
//! pending for a future session.

mod classify;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
