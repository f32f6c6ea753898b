//! Progress and completion notifications.
//!
//! Listeners are called from worker threads, possibly several at once.

use std::fmt;
use std::path::Path;

/// Result code delivered with `on_finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishCode {
    /// Destination written and verified.
    None,
    /// Probe failed or the server answered with an unusable status.
    NotFound,
    /// Temp file size did not match the remote length.
    FileError,
    /// Filesystem failure while finalizing, or blocks left unfinished.
    Other,
}

impl fmt::Display for FinishCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinishCode::None => "ok",
            FinishCode::NotFound => "not found",
            FinishCode::FileError => "file error",
            FinishCode::Other => "failed",
        };
        f.write_str(s)
    }
}

/// Receiver of session events.
pub trait DownloadListener: Send + Sync {
    /// Downloading is about to begin (not called when nothing is left to fetch).
    fn on_start(&self, _url: &str, _destination: &Path) {}

    /// `current` bytes of `total` are on disk. `is_final` is set once, after
    /// successful finalization.
    fn on_progress(&self, _url: &str, _destination: &Path, _current: u64, _total: u64, _is_final: bool) {}

    /// Terminal outcome. Called at most once per session.
    fn on_finish(&self, url: &str, destination: &Path, code: FinishCode);
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl DownloadListener for NoopListener {
    fn on_finish(&self, _url: &str, _destination: &Path, _code: FinishCode) {}
}

/// Listener that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl DownloadListener for TracingListener {
    fn on_start(&self, url: &str, destination: &Path) {
        tracing::info!(url, destination = %destination.display(), "download started");
    }

    fn on_progress(&self, url: &str, _destination: &Path, current: u64, total: u64, is_final: bool) {
        tracing::trace!(url, current, total, is_final, "progress");
    }

    fn on_finish(&self, url: &str, destination: &Path, code: FinishCode) {
        tracing::info!(url, destination = %destination.display(), %code, "download finished");
    }
}
