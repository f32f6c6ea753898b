use std::time::Duration;

/// Coarse failure category used to decide whether a released block is worth
/// reclaiming in the same session run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or read timeout.
    Timeout,
    /// 429 / 503: the server asked us to back off.
    Throttled,
    /// Reset, refused, DNS failure, body cut short.
    Connection,
    /// Other 5xx status.
    Http5xx(u16),
    /// Everything else (4xx, disk errors, ledger errors). Not retried.
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Other)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Leave the block pending for a future session.
    NoRetry,
    /// Wait, then let the block be claimed again.
    RetryAfter(Duration),
}

/// Capped exponential backoff, counted per block.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts allowed per block in one session run (including the first).
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `failed_attempts + 1`: `base * 2^(failed_attempts - 1)`, capped.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let shift = failed_attempts.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// `failed_attempts` is how many times this block has failed so far in this run (>= 1).
    pub fn decide(&self, failed_attempts: u32, kind: ErrorKind) -> RetryDecision {
        if !kind.is_retryable() || failed_attempts >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(failed_attempts))
    }
}
