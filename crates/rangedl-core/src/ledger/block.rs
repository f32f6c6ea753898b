//! Block type and claim handle.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Lifecycle of a block: `Pending -> Claimed -> Done`, or `Claimed -> Pending` on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Pending,
    Claimed,
    Done,
}

/// A contiguous byte range `[start, end)` of the remote resource plus its write cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// First byte of the block (inclusive).
    pub start: u64,
    /// End of the block (exclusive). Fixed at plan time.
    pub end: u64,
    /// Next offset to write; `start <= progress <= end`.
    pub progress: u64,
    pub status: BlockStatus,
}

impl Block {
    /// Fresh pending block with no progress.
    pub fn pending(range: Range<u64>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            progress: range.start,
            status: BlockStatus::Pending,
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes already written for this block.
    pub fn bytes_done(&self) -> u64 {
        self.progress.saturating_sub(self.start)
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Exclusive ownership of one block, handed out by `Ledger::find_claimable_block`.
///
/// Holds only the index and the window captured at claim time; all later reads
/// and mutations go through the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub index: usize,
    /// Offset where fetching resumes (the block's progress when claimed).
    pub start: u64,
    /// Exclusive end of the block.
    pub end: u64,
}

impl Claim {
    pub fn window(&self) -> Range<u64> {
        self.start..self.end
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range spec with inclusive end: `start-(end-1)`.
    pub fn range_spec(&self) -> String {
        format!("{}-{}", self.start, self.end.saturating_sub(1))
    }

    /// HTTP Range header value: `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.range_spec())
    }
}
