//! Block planning and ledger reuse decisions.

use std::ops::Range;

use super::block::Block;
use super::LedgerSnapshot;

/// Planned partition of `[0, total_length)` into blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub total_length: u64,
    /// Nominal block size. Equals `total_length` for a single-block plan.
    pub block_size: u64,
    pub ranges: Vec<Range<u64>>,
}

impl Plan {
    pub fn block_count(&self) -> usize {
        self.ranges.len()
    }

    /// Fresh pending blocks for this plan.
    pub fn blocks(&self) -> Vec<Block> {
        self.ranges.iter().cloned().map(Block::pending).collect()
    }

    /// True if `ledger` was built for exactly this partition and may be resumed as-is.
    pub fn matches(&self, ledger: &LedgerSnapshot) -> bool {
        ledger.total_length == self.total_length
            && ledger.blocks.len() == self.ranges.len()
            && ledger
                .blocks
                .iter()
                .zip(&self.ranges)
                .all(|(b, r)| b.range() == *r)
    }
}

/// Builds the block plan for a resource of `total_length` bytes.
///
/// Without range support the whole resource is a single block, whatever
/// `block_size` says. With range support the blocks are `block_size` long and
/// the last one may be shorter. A zero-length resource has no blocks.
pub fn plan_blocks(total_length: u64, resumable: bool, block_size: u64) -> Plan {
    if total_length == 0 {
        return Plan {
            total_length,
            block_size: block_size.max(1),
            ranges: Vec::new(),
        };
    }
    if !resumable || block_size == 0 || block_size >= total_length {
        return Plan {
            total_length,
            block_size: total_length,
            ranges: vec![0..total_length],
        };
    }

    let count = total_length.div_ceil(block_size);
    let ranges = (0..count)
        .map(|i| {
            let start = i * block_size;
            start..(start + block_size).min(total_length)
        })
        .collect();
    Plan {
        total_length,
        block_size,
        ranges,
    }
}
