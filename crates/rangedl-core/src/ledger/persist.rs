//! Sidecar file encoding: JSON, written to a sibling `.new` file and renamed into place.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::block::{Block, BlockStatus};
use super::error::LedgerError;
use super::LedgerSnapshot;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    total_length: u64,
    block_size: u64,
    blocks: Vec<Block>,
}

fn staging_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".new");
    PathBuf::from(o)
}

/// Claims do not outlive the process that made them.
fn unclaimed(b: &Block) -> Block {
    let mut b = *b;
    if b.status == BlockStatus::Claimed {
        b.status = BlockStatus::Pending;
    }
    b
}

pub(super) fn write(path: &Path, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
    let file = LedgerFile {
        version: FORMAT_VERSION,
        total_length: snapshot.total_length,
        block_size: snapshot.block_size,
        blocks: snapshot.blocks.iter().map(unclaimed).collect(),
    };
    let bytes = serde_json::to_vec(&file)?;
    let staging = staging_path(path);
    fs::write(&staging, bytes).map_err(|e| LedgerError::io(&staging, e))?;
    fs::rename(&staging, path).map_err(|e| LedgerError::io(path, e))?;
    Ok(())
}

/// Reads and validates a sidecar file. Any problem yields `None`.
pub(super) fn read(path: &Path) -> Option<LedgerSnapshot> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "ledger unreadable, ignoring");
            }
            return None;
        }
    };
    let file: LedgerFile = match serde_json::from_slice(&data) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ledger corrupt, ignoring");
            return None;
        }
    };
    if file.version != FORMAT_VERSION {
        tracing::warn!(version = file.version, "unsupported ledger version, ignoring");
        return None;
    }
    let snapshot = LedgerSnapshot {
        total_length: file.total_length,
        block_size: file.block_size,
        blocks: file.blocks.iter().map(unclaimed).collect(),
    };
    if let Err(reason) = check_invariants(&snapshot) {
        tracing::warn!(path = %path.display(), reason, "ledger inconsistent, ignoring");
        return None;
    }
    Some(snapshot)
}

fn check_invariants(s: &LedgerSnapshot) -> Result<(), &'static str> {
    let mut offset = 0u64;
    for b in &s.blocks {
        if b.start != offset {
            return Err("blocks not contiguous");
        }
        if b.end <= b.start {
            return Err("empty or inverted block");
        }
        if b.progress < b.start || b.progress > b.end {
            return Err("progress outside block");
        }
        offset = b.end;
    }
    if offset != s.total_length {
        return Err("blocks do not cover total length");
    }
    Ok(())
}
