//! Block transfer error type for retry classification.

use crate::ledger::LedgerError;

/// Failure while fetching one block. The block is released, never marked done.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Response status was neither 206 nor 200.
    #[error("HTTP {0}")]
    Http(u32),
    /// The body ended before the block window was filled.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Writing to the temp file failed (disk full, permissions).
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// Recording progress in the ledger failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}
