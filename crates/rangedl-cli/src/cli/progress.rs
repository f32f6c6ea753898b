//! Terminal progress output for `get`.

use rangedl_core::{DownloadListener, FinishCode};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const PRINT_INTERVAL: Duration = Duration::from_millis(500);

/// Lets one update through per interval. Final updates always pass.
#[derive(Debug)]
pub(crate) struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub(crate) fn ready(&mut self, now: Instant, is_final: bool) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due || is_final {
            self.last = Some(now);
        }
        due || is_final
    }
}

pub(crate) fn format_progress(current: u64, total: u64) -> String {
    if total == 0 {
        return "100.0% (0 B)".to_string();
    }
    let pct = current as f64 * 100.0 / total as f64;
    format!("{pct:5.1}% ({current}/{total} bytes)")
}

/// Prints throttled progress lines to stdout.
pub struct ProgressPrinter {
    throttle: Mutex<Throttle>,
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self {
            throttle: Mutex::new(Throttle::new(PRINT_INTERVAL)),
        }
    }
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadListener for ProgressPrinter {
    fn on_start(&self, url: &str, destination: &Path) {
        println!("Downloading {url} -> {}", destination.display());
    }

    fn on_progress(&self, _url: &str, _destination: &Path, current: u64, total: u64, is_final: bool) {
        let ready = self
            .throttle
            .lock()
            .map(|mut t| t.ready(Instant::now(), is_final))
            .unwrap_or(false);
        if !ready {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}", format_progress(current, total));
        if is_final {
            let _ = writeln!(out);
        }
        let _ = out.flush();
    }

    fn on_finish(&self, url: &str, _destination: &Path, code: FinishCode) {
        tracing::info!(url, %code, "download finished");
        if code != FinishCode::None {
            println!();
        }
    }
}
