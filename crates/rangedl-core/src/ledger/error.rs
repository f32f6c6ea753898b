use std::path::{Path, PathBuf};

use super::block::BlockStatus;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("block {0} does not exist")]
    UnknownBlock(usize),
    #[error("block {index} is {status:?}, expected Claimed")]
    NotClaimed { index: usize, status: BlockStatus },
}

impl LedgerError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
