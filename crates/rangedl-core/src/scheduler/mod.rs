//! Bounded worker pool over the block ledger.
//!
//! Each worker claims a block, fetches it, then claims the next pending block
//! after the one it just finished, until the ledger has nothing left to hand
//! out. Workers start at different indices so they do not all scan from the
//! same place. The first worker to see the ledger complete runs the
//! completion hook; every other worker simply drains.

mod worker;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::fetch::FetchContext;
use crate::retry::RetryPolicy;

/// Summary of one pool run.
#[derive(Debug)]
pub struct PoolReport<T> {
    /// Blocks completed during this run.
    pub completed: usize,
    /// Blocks given up on for this run (still Pending in the ledger).
    pub abandoned: usize,
    /// At least one worker observed cancellation.
    pub cancelled: bool,
    /// Value returned by the completion hook, if the ledger reached completion.
    pub finished: Option<T>,
}

/// State shared by all workers of one pool run.
struct Shared<'a, T, F> {
    ctx: &'a FetchContext<'a>,
    retry: RetryPolicy,
    failures: Mutex<HashMap<usize, u32>>,
    abandoned: Mutex<HashSet<usize>>,
    completed: AtomicUsize,
    cancelled: AtomicBool,
    finalize_claimed: AtomicBool,
    finished: OnceLock<T>,
    on_complete: F,
}

/// Runs up to `concurrency` workers until no block can be claimed.
///
/// `on_complete` runs at most once, on the worker that first observes a
/// complete ledger.
pub fn run_pool<T, F>(
    ctx: &FetchContext<'_>,
    concurrency: usize,
    retry: RetryPolicy,
    on_complete: F,
) -> PoolReport<T>
where
    T: Send + Sync,
    F: Fn() -> T + Sync,
{
    let workers = concurrency.max(1).min(ctx.ledger.block_count());
    let shared = Shared {
        ctx,
        retry,
        failures: Mutex::new(HashMap::new()),
        abandoned: Mutex::new(HashSet::new()),
        completed: AtomicUsize::new(0),
        cancelled: AtomicBool::new(false),
        finalize_claimed: AtomicBool::new(false),
        finished: OnceLock::new(),
        on_complete,
    };

    tracing::debug!(workers, blocks = ctx.ledger.block_count(), "starting worker pool");
    std::thread::scope(|scope| {
        for seed in 0..workers {
            let shared = &shared;
            scope.spawn(move || worker::run(shared, seed));
        }
    });

    let abandoned = shared
        .abandoned
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .len();
    PoolReport {
        completed: shared.completed.load(Ordering::Relaxed),
        abandoned,
        cancelled: shared.cancelled.load(Ordering::Relaxed),
        finished: shared.finished.into_inner(),
    }
}
