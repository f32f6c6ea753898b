//! Cooperative cancellation for a download session.
//!
//! A `CancelToken` is handed to every block fetch; fetchers check it at each
//! chunk boundary and release their block when it is set. Already-written
//! bytes are kept, so the session can be resumed later.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of cancellable sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `d`, waking early on cancellation. Returns false if cancelled.
    pub fn sleep(&self, d: Duration) -> bool {
        let deadline = Instant::now() + d;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}
