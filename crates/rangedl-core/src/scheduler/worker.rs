//! One pool worker: claim → fetch → claim the next block.

use std::sync::atomic::Ordering;

use super::Shared;
use crate::fetch::{fetch_block, BlockError, FetchOutcome};
use crate::retry::{classify, RetryDecision};

pub(super) fn run<T, F>(shared: &Shared<'_, T, F>, seed: usize)
where
    F: Fn() -> T,
{
    let ctx = shared.ctx;
    let mut next = seed;

    loop {
        if ctx.cancel.is_cancelled() {
            shared.cancelled.store(true, Ordering::Relaxed);
            break;
        }
        let claim = ctx.ledger.find_claimable_block_where(next, |i| {
            !shared
                .abandoned
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .contains(&i)
        });
        let Some(claim) = claim else {
            tracing::debug!(seed, "no claimable block, worker exiting");
            break;
        };

        match fetch_block(ctx, claim) {
            Ok(FetchOutcome::Completed) => {
                shared.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(FetchOutcome::Cancelled) => {
                shared.cancelled.store(true, Ordering::Relaxed);
                break;
            }
            Err(e) => {
                if !handle_failure(shared, claim.index, &e) {
                    shared.cancelled.store(true, Ordering::Relaxed);
                    break;
                }
            }
        }

        if ctx.ledger.is_complete() {
            if !shared.finalize_claimed.swap(true, Ordering::AcqRel) {
                let value = (shared.on_complete)();
                let _ = shared.finished.set(value);
            }
            break;
        }
        next = claim.index + 1;
    }
}

/// Applies the retry policy to a released block. Returns false if cancelled while backing off.
fn handle_failure<T, F>(shared: &Shared<'_, T, F>, index: usize, err: &BlockError) -> bool {
    let attempts = {
        let mut failures = shared.failures.lock().unwrap_or_else(|e| e.into_inner());
        let n = failures.entry(index).or_insert(0);
        *n += 1;
        *n
    };
    match shared.retry.decide(attempts, classify(err)) {
        RetryDecision::RetryAfter(delay) => {
            tracing::info!(index, attempts, ?delay, error = %err, "block will be retried");
            shared.ctx.cancel.sleep(delay)
        }
        RetryDecision::NoRetry => {
            tracing::warn!(index, attempts, error = %err, "giving up on block for this run");
            shared
                .abandoned
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(index);
            true
        }
    }
}
