//! Verify the temp file and promote it to the destination.

use std::io;

use thiserror::Error;

use crate::notify::{DownloadListener, FinishCode};
use crate::storage;

use super::{Session, SessionOutcome};

/// Why the temp file could not become the destination.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("temp file holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("filesystem: {0}")]
    Filesystem(#[from] io::Error),
}

impl FinalizeError {
    pub fn finish_code(&self) -> FinishCode {
        match self {
            FinalizeError::SizeMismatch { .. } => FinishCode::FileError,
            FinalizeError::Filesystem(_) => FinishCode::Other,
        }
    }
}

/// Checks the temp file length and moves it into place. Returns the size.
fn promote_verified(session: &Session) -> Result<u64, FinalizeError> {
    let actual = match storage::file_len(&session.temp_path) {
        Ok(n) => n,
        Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e.into()),
    };
    if actual != session.total_length || !session.temp_path.exists() {
        return Err(FinalizeError::SizeMismatch {
            expected: session.total_length,
            actual,
        });
    }
    storage::sync_file(&session.temp_path)?;
    storage::promote(&session.temp_path, &session.destination)?;
    Ok(actual)
}

/// Runs once the ledger is complete.
///
/// Size mismatch or a failed move leaves the temp file and ledger in place so
/// the state can be inspected or resumed.
pub fn finalize(session: &Session, listener: &dyn DownloadListener) -> SessionOutcome {
    let url = session.source_url.as_str();
    let destination = session.destination.as_path();

    let size = match promote_verified(session) {
        Ok(size) => size,
        Err(e) => {
            tracing::error!(
                temp = %session.temp_path.display(),
                destination = %destination.display(),
                error = %e,
                "finalize failed"
            );
            let code = e.finish_code();
            listener.on_finish(url, destination, code);
            return match e {
                FinalizeError::SizeMismatch { .. } => SessionOutcome::FileError,
                FinalizeError::Filesystem(_) => SessionOutcome::Failed,
            };
        }
    };

    if let Err(e) = storage::remove_if_exists(&session.ledger_path) {
        tracing::warn!(path = %session.ledger_path.display(), error = %e, "could not remove ledger");
    }

    tracing::info!(destination = %destination.display(), bytes = size, "download finished");
    listener.on_progress(url, destination, size, session.total_length, true);
    listener.on_finish(url, destination, FinishCode::None);
    SessionOutcome::Finished
}
