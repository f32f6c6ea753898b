//! Listener that records every event for assertions.

use rangedl_core::{CancelToken, DownloadListener, FinishCode};
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
pub struct Recorder {
    pub starts: Mutex<usize>,
    pub progress: Mutex<Vec<(u64, u64, bool)>>,
    pub finishes: Mutex<Vec<FinishCode>>,
    /// Cancel this token once `current` reaches the threshold.
    pub cancel_at: Option<(u64, CancelToken)>,
}

impl Recorder {
    pub fn cancelling_at(bytes: u64, token: CancelToken) -> Self {
        Self {
            cancel_at: Some((bytes, token)),
            ..Self::default()
        }
    }

    pub fn finishes(&self) -> Vec<FinishCode> {
        self.finishes.lock().unwrap().clone()
    }

    pub fn final_progress(&self) -> Vec<(u64, u64)> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, is_final)| *is_final)
            .map(|&(c, t, _)| (c, t))
            .collect()
    }
}

impl DownloadListener for Recorder {
    fn on_start(&self, _url: &str, _destination: &Path) {
        *self.starts.lock().unwrap() += 1;
    }

    fn on_progress(&self, _url: &str, _destination: &Path, current: u64, total: u64, is_final: bool) {
        self.progress.lock().unwrap().push((current, total, is_final));
        if let Some((threshold, token)) = &self.cancel_at {
            if current >= *threshold {
                token.cancel();
            }
        }
    }

    fn on_finish(&self, _url: &str, _destination: &Path, code: FinishCode) {
        self.finishes.lock().unwrap().push(code);
    }
}
