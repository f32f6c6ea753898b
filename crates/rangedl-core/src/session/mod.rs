//! One download of one URL to one destination.
//!
//! Probe the resource, reconcile the on-disk ledger with a fresh plan, run the
//! worker pool over whatever is still pending, and finalize once every block
//! is done. Every session ends in exactly one `SessionOutcome`; the listener
//! hears `on_finish` for every outcome except cancellation.

mod finalize;

pub use finalize::{finalize, FinalizeError};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::DownloaderConfig;
use crate::control::CancelToken;
use crate::fetch::FetchContext;
use crate::http::HttpOptions;
use crate::ledger::{plan_blocks, BlockStatus, Ledger, LedgerError};
use crate::notify::{DownloadListener, FinishCode};
use crate::probe::{self, ProbeOutcome};
use crate::scheduler;
use crate::storage;

/// Paths and remote facts for one download, fixed once the probe succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub source_url: String,
    pub destination: PathBuf,
    pub temp_path: PathBuf,
    pub ledger_path: PathBuf,
    pub block_size: u64,
    pub total_length: u64,
    pub resumable: bool,
}

impl Session {
    pub fn new(
        source_url: &str,
        destination: &Path,
        block_size: u64,
        total_length: u64,
        resumable: bool,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            destination: destination.to_path_buf(),
            temp_path: storage::temp_path(destination),
            ledger_path: storage::ledger_path(destination),
            block_size,
            total_length,
            resumable,
        }
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// File is at the destination; temp file and ledger are gone.
    Finished,
    /// Probe failed; nothing was written.
    NotFound,
    /// Temp file size did not match the remote length. State kept.
    FileError,
    /// Setup or promotion failed.
    Failed,
    /// Cancel token fired. Progress kept for the next run.
    Cancelled,
    /// Pool drained with blocks still pending after retries ran out.
    Incomplete { pending_blocks: usize },
}

impl SessionOutcome {
    /// Code delivered to `on_finish`, or `None` when no finish is emitted.
    pub fn finish_code(&self) -> Option<FinishCode> {
        match self {
            SessionOutcome::Finished => Some(FinishCode::None),
            SessionOutcome::NotFound => Some(FinishCode::NotFound),
            SessionOutcome::FileError => Some(FinishCode::FileError),
            SessionOutcome::Failed | SessionOutcome::Incomplete { .. } => Some(FinishCode::Other),
            SessionOutcome::Cancelled => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Finished)
    }
}

/// Errors that stop a session before any block is fetched.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("temp file {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Drives one download through probe, plan, fetch and finalize.
pub struct DownloadSession<L> {
    url: String,
    destination: PathBuf,
    config: DownloaderConfig,
    listener: L,
}

impl<L: DownloadListener> DownloadSession<L> {
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        config: DownloaderConfig,
        listener: L,
    ) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            config,
            listener,
        }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Runs the session to a terminal outcome.
    ///
    /// Setup failures are reported to the listener as `Other` and then
    /// returned as the error; everything after setup is an outcome.
    pub fn run(&self, cancel: &CancelToken) -> Result<SessionOutcome, SessionError> {
        self.run_inner(cancel).inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "download setup failed");
            self.listener
                .on_finish(&self.url, &self.destination, FinishCode::Other);
        })
    }

    fn run_inner(&self, cancel: &CancelToken) -> Result<SessionOutcome, SessionError> {
        self.config.validate().map_err(|e| SessionError::Config(e.to_string()))?;
        let http = HttpOptions::from_config(&self.config);

        let probed = match probe::probe(&self.url, &http) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "probe failed");
                self.listener
                    .on_finish(&self.url, &self.destination, FinishCode::NotFound);
                return Ok(SessionOutcome::NotFound);
            }
        };
        let session = self.session_for(&probed);
        tracing::info!(
            url = %session.source_url,
            total = session.total_length,
            resumable = session.resumable,
            "probed resource"
        );

        let plan = plan_blocks(session.total_length, session.resumable, session.block_size);
        storage::create_parent_dirs(&session.destination).map_err(|e| self.storage_err(&session, e))?;
        let (mut ledger, mut reused) = Ledger::create_or_read(&session.ledger_path, &plan)?;
        if reused {
            let on_disk = storage::file_len(&session.temp_path).unwrap_or(0);
            let extent = ledger.written_extent();
            if on_disk < extent {
                tracing::warn!(
                    temp = %session.temp_path.display(),
                    on_disk,
                    extent,
                    "temp file shorter than recorded progress, starting over"
                );
                ledger = Ledger::initialize(&session.ledger_path, &plan)?;
                reused = false;
            }
        }
        let ledger = ledger.with_flush_interval(self.config.progress_flush_interval());
        if !reused {
            // Bytes in an old temp file belong to a different plan.
            storage::remove_if_exists(&session.temp_path).map_err(|e| self.storage_err(&session, e))?;
        }
        storage::ensure_temp_file(&session.temp_path).map_err(|e| self.storage_err(&session, e))?;

        if ledger.is_complete() {
            tracing::debug!("ledger already complete, finalizing");
            return Ok(finalize(&session, &self.listener));
        }

        self.listener.on_start(&session.source_url, &session.destination);
        let ctx = FetchContext {
            url: &session.source_url,
            destination: &session.destination,
            temp_path: &session.temp_path,
            total_length: session.total_length,
            chunk_size: self.config.chunk_size,
            http: &http,
            ledger: &ledger,
            listener: &self.listener,
            cancel,
        };
        let report = scheduler::run_pool(
            &ctx,
            self.config.concurrency,
            self.config.retry_policy(),
            || finalize(&session, &self.listener),
        );
        tracing::debug!(
            completed = report.completed,
            abandoned = report.abandoned,
            cancelled = report.cancelled,
            "worker pool drained"
        );

        if let Some(outcome) = report.finished {
            return Ok(outcome);
        }
        if let Err(e) = ledger.sync() {
            tracing::warn!(error = %e, "final ledger flush failed");
        }
        if report.cancelled || cancel.is_cancelled() {
            tracing::info!(bytes_done = ledger.bytes_done(), "download cancelled");
            return Ok(SessionOutcome::Cancelled);
        }

        let snapshot = ledger.snapshot();
        let pending_blocks = snapshot.blocks.len() - snapshot.count(BlockStatus::Done);
        tracing::warn!(pending_blocks, "download incomplete, blocks left pending");
        self.listener
            .on_finish(&session.source_url, &session.destination, FinishCode::Other);
        Ok(SessionOutcome::Incomplete { pending_blocks })
    }

    fn session_for(&self, probed: &ProbeOutcome) -> Session {
        let total = probed.total_length();
        let block_size = if probed.is_resumable() {
            self.config.block_size
        } else {
            total
        };
        Session::new(
            &self.url,
            &self.destination,
            block_size,
            total,
            probed.is_resumable(),
        )
    }

    fn storage_err(&self, session: &Session, source: std::io::Error) -> SessionError {
        SessionError::Storage {
            path: session.temp_path.clone(),
            source,
        }
    }
}
