//! Block ledger: the persistent record of which byte ranges are done.
//!
//! All state lives behind one mutex together with the sidecar file it is
//! persisted to, so claims, releases, progress updates and the completion
//! check are serialized across workers even though the byte ranges they
//! cover are disjoint. Status changes are written through immediately;
//! progress-only updates are flushed at most once per flush interval.

mod block;
mod error;
mod persist;
mod plan;

pub use block::{Block, BlockStatus, Claim};
pub use error::LedgerError;
pub use plan::{plan_blocks, Plan};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default minimum interval between progress-only flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Point-in-time copy of a ledger's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub total_length: u64,
    pub block_size: u64,
    pub blocks: Vec<Block>,
}

impl LedgerSnapshot {
    pub fn bytes_done(&self) -> u64 {
        self.blocks.iter().map(Block::bytes_done).sum()
    }

    pub fn count(&self, status: BlockStatus) -> usize {
        self.blocks.iter().filter(|b| b.status == status).count()
    }

    pub fn is_complete(&self) -> bool {
        self.blocks.iter().all(|b| b.status == BlockStatus::Done)
    }

    /// Offset just past the last recorded byte; a temp file shorter than this
    /// cannot hold what the ledger claims was written.
    pub fn written_extent(&self) -> u64 {
        self.blocks
            .iter()
            .filter(|b| b.bytes_done() > 0)
            .map(|b| b.progress)
            .max()
            .unwrap_or(0)
    }
}

struct State {
    snapshot: LedgerSnapshot,
    last_flush: Instant,
    dirty: bool,
}

/// Shared, synchronized block ledger bound to one sidecar file.
pub struct Ledger {
    path: PathBuf,
    flush_interval: Duration,
    state: Mutex<State>,
}

impl Ledger {
    /// Reads the persisted ledger at `path`. Absent, corrupt or inconsistent
    /// files all yield `None`; the caller then rebuilds from a fresh plan.
    pub fn load(path: &Path) -> Option<LedgerSnapshot> {
        persist::read(path)
    }

    /// Replaces any persisted state at `path` with fresh pending blocks from `plan`.
    pub fn initialize(path: &Path, plan: &Plan) -> Result<Self, LedgerError> {
        let snapshot = LedgerSnapshot {
            total_length: plan.total_length,
            block_size: plan.block_size,
            blocks: plan.blocks(),
        };
        persist::write(path, &snapshot)?;
        Ok(Self::from_snapshot(path, snapshot))
    }

    /// Loads the ledger at `path` if it was built for `plan`, else initializes a new one.
    /// The flag is true when prior progress was kept.
    pub fn create_or_read(path: &Path, plan: &Plan) -> Result<(Self, bool), LedgerError> {
        match Self::load(path) {
            Some(existing) if plan.matches(&existing) => {
                tracing::debug!(
                    path = %path.display(),
                    done = existing.count(BlockStatus::Done),
                    blocks = existing.blocks.len(),
                    "reusing ledger"
                );
                Ok((Self::from_snapshot(path, existing), true))
            }
            Some(_) => {
                tracing::info!(path = %path.display(), "ledger does not match remote resource, rebuilding");
                Ok((Self::initialize(path, plan)?, false))
            }
            None => Ok((Self::initialize(path, plan)?, false)),
        }
    }

    fn from_snapshot(path: &Path, snapshot: LedgerSnapshot) -> Self {
        Self {
            path: path.to_path_buf(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            state: Mutex::new(State {
                snapshot,
                last_flush: Instant::now(),
                dirty: false,
            }),
        }
    }

    /// Overrides the progress flush interval (zero flushes on every update).
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, state: &mut State) -> Result<(), LedgerError> {
        persist::write(&self.path, &state.snapshot)?;
        state.last_flush = Instant::now();
        state.dirty = false;
        Ok(())
    }

    fn claimed_block<'a>(state: &'a mut State, index: usize) -> Result<&'a mut Block, LedgerError> {
        let block = state
            .snapshot
            .blocks
            .get_mut(index)
            .ok_or(LedgerError::UnknownBlock(index))?;
        if block.status != BlockStatus::Claimed {
            return Err(LedgerError::NotClaimed {
                index,
                status: block.status,
            });
        }
        Ok(block)
    }

    /// Claims the first pending block at or after `from`, wrapping around once.
    pub fn find_claimable_block(&self, from: usize) -> Option<Claim> {
        self.find_claimable_block_where(from, |_| true)
    }

    /// Like `find_claimable_block`, but only considers indices accepted by `eligible`.
    pub fn find_claimable_block_where<F>(&self, from: usize, eligible: F) -> Option<Claim>
    where
        F: Fn(usize) -> bool,
    {
        let mut state = self.lock();
        let blocks = &mut state.snapshot.blocks;
        let n = blocks.len();
        let from = from.min(n);
        let index = (from..n)
            .chain(0..from)
            .find(|&i| blocks[i].status == BlockStatus::Pending && eligible(i))?;
        let block = &mut blocks[index];
        block.status = BlockStatus::Claimed;
        tracing::debug!(index, start = block.progress, end = block.end, "claimed block");
        Some(Claim {
            index,
            start: block.progress,
            end: block.end,
        })
    }

    /// Returns a claimed block to Pending, keeping its progress.
    pub fn release(&self, index: usize) -> Result<(), LedgerError> {
        let mut state = self.lock();
        Self::claimed_block(&mut state, index)?.status = BlockStatus::Pending;
        self.flush(&mut state)
    }

    /// Marks a claimed block as fully written.
    pub fn mark_done(&self, index: usize) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let block = Self::claimed_block(&mut state, index)?;
        block.progress = block.end;
        block.status = BlockStatus::Done;
        self.flush(&mut state)
    }

    /// Records that a claimed block has been written up to `offset`.
    ///
    /// Progress never moves backwards and never passes the block end. Returns the
    /// session-wide number of bytes written so far.
    pub fn update_progress(&self, index: usize, offset: u64) -> Result<u64, LedgerError> {
        let mut state = self.lock();
        let block = Self::claimed_block(&mut state, index)?;
        let clamped = offset.clamp(block.progress, block.end);
        if clamped != block.progress {
            block.progress = clamped;
            state.dirty = true;
        }
        let done = state.snapshot.bytes_done();
        if state.dirty && state.last_flush.elapsed() >= self.flush_interval {
            self.flush(&mut state)?;
        }
        Ok(done)
    }

    /// Writes out any progress not yet flushed.
    pub fn sync(&self) -> Result<(), LedgerError> {
        let mut state = self.lock();
        if state.dirty {
            self.flush(&mut state)?;
        }
        Ok(())
    }

    /// True iff every block is Done (vacuously true for an empty resource).
    pub fn is_complete(&self) -> bool {
        self.lock().snapshot.is_complete()
    }

    pub fn bytes_done(&self) -> u64 {
        self.lock().snapshot.bytes_done()
    }

    pub fn written_extent(&self) -> u64 {
        self.lock().snapshot.written_extent()
    }

    pub fn block_count(&self) -> usize {
        self.lock().snapshot.blocks.len()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn ledger(dir: &tempfile::TempDir, total: u64, resumable: bool, size: u64) -> Ledger {
        let path = dir.path().join("out.bin.cfg");
        Ledger::initialize(&path, &plan_blocks(total, resumable, size))
            .unwrap()
            .with_flush_interval(Duration::ZERO)
    }

    #[test]
    fn claims_walk_forward_and_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 10, true, 3);
        assert_eq!(l.find_claimable_block(2).unwrap().index, 2);
        assert_eq!(l.find_claimable_block(2).unwrap().index, 3);
        assert_eq!(l.find_claimable_block(4).unwrap().index, 0);
        let last = l.find_claimable_block(0).unwrap();
        assert_eq!(last.index, 1);
        assert_eq!(last.window(), 3..6);
        assert!(l.find_claimable_block(0).is_none());
    }

    #[test]
    fn full_lifecycle_reaches_completion() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 10, true, 3);
        assert!(!l.is_complete());
        while let Some(c) = l.find_claimable_block(0) {
            assert!(l.update_progress(c.index, c.end).unwrap() > 0);
            l.mark_done(c.index).unwrap();
        }
        assert!(l.is_complete());
        assert_eq!(l.bytes_done(), 10);
        let persisted = Ledger::load(l.path()).unwrap();
        assert!(persisted.is_complete());
    }

    #[test]
    fn release_keeps_progress_and_reclaims_from_there() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 500_000, false, 3);
        let c = l.find_claimable_block(0).unwrap();
        assert_eq!(c.window(), 0..500_000);
        l.update_progress(c.index, 1000).unwrap();
        l.release(c.index).unwrap();

        let snap = l.snapshot();
        assert_eq!(snap.blocks[0].status, BlockStatus::Pending);
        assert_eq!(snap.blocks[0].progress, 1000);
        assert!(!l.is_complete());

        let again = l.find_claimable_block(0).unwrap();
        assert_eq!(again.window(), 1000..500_000);
    }

    #[test]
    fn progress_is_monotonic_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 10, true, 3);
        let c = l.find_claimable_block(1).unwrap();
        assert_eq!(l.update_progress(c.index, 5).unwrap(), 2);
        assert_eq!(l.update_progress(c.index, 4).unwrap(), 2);
        assert_eq!(l.update_progress(c.index, 99).unwrap(), 3);
        assert_eq!(l.snapshot().blocks[1].progress, 6);
    }

    #[test]
    fn mutations_require_a_claim() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 10, true, 3);
        assert!(matches!(
            l.update_progress(0, 1),
            Err(LedgerError::NotClaimed { index: 0, .. })
        ));
        assert!(matches!(l.mark_done(1), Err(LedgerError::NotClaimed { .. })));
        assert!(matches!(l.release(9), Err(LedgerError::UnknownBlock(9))));
    }

    #[test]
    fn eligibility_filter_skips_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 10, true, 3);
        let c = l.find_claimable_block_where(0, |i| i != 0 && i != 1).unwrap();
        assert_eq!(c.index, 2);
        assert!(l.find_claimable_block_where(0, |i| i == 2).is_none());
    }

    #[test]
    fn create_or_read_reuses_matching_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.cfg");
        let plan = plan_blocks(10, true, 3);
        {
            let (l, reused) = Ledger::create_or_read(&path, &plan).unwrap();
            assert!(!reused);
            let l = l.with_flush_interval(Duration::ZERO);
            let c = l.find_claimable_block(0).unwrap();
            l.mark_done(c.index).unwrap();
            let c = l.find_claimable_block(0).unwrap();
            l.update_progress(c.index, 4).unwrap();
        }
        let (l, reused) = Ledger::create_or_read(&path, &plan).unwrap();
        assert!(reused);
        let snap = l.snapshot();
        assert_eq!(snap.blocks[0].status, BlockStatus::Done);
        assert_eq!(snap.blocks[1].status, BlockStatus::Pending);
        assert_eq!(snap.blocks[1].progress, 4);
    }

    #[test]
    fn create_or_read_rebuilds_when_length_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.cfg");
        {
            let (l, _) = Ledger::create_or_read(&path, &plan_blocks(10, true, 3)).unwrap();
            let c = l.find_claimable_block(0).unwrap();
            l.mark_done(c.index).unwrap();
        }
        let (l, reused) = Ledger::create_or_read(&path, &plan_blocks(12, true, 3)).unwrap();
        assert!(!reused);
        let snap = l.snapshot();
        assert_eq!(snap.total_length, 12);
        assert_eq!(snap.count(BlockStatus::Pending), 4);
        assert_eq!(snap.bytes_done(), 0);
    }

    #[test]
    fn written_extent_tracks_furthest_progress() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 10, true, 3);
        assert_eq!(l.written_extent(), 0);
        let c = l.find_claimable_block(1).unwrap();
        l.update_progress(c.index, 5).unwrap();
        assert_eq!(l.written_extent(), 5);
        let c = l.find_claimable_block(0).unwrap();
        assert_eq!(c.index, 0);
        l.mark_done(c.index).unwrap();
        assert_eq!(l.written_extent(), 5);
        let c = l.find_claimable_block(3).unwrap();
        l.mark_done(c.index).unwrap();
        assert_eq!(l.written_extent(), 10);
    }

    #[test]
    fn empty_ledger_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir, 0, true, 3);
        assert!(l.is_complete());
        assert!(l.find_claimable_block(0).is_none());
    }

    #[test]
    fn concurrent_claims_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let l = Arc::new(ledger(&dir, 5, true, 1));
        let held = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..16)
            .map(|t| {
                let l = Arc::clone(&l);
                let held = Arc::clone(&held);
                std::thread::spawn(move || {
                    for round in 0..200 {
                        if let Some(c) = l.find_claimable_block(t + round) {
                            assert!(
                                held.lock().unwrap().insert(c.index),
                                "block {} handed out twice",
                                c.index
                            );
                            std::thread::yield_now();
                            held.lock().unwrap().remove(&c.index);
                            l.release(c.index).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(l.snapshot().count(BlockStatus::Pending), 5);
    }
}
