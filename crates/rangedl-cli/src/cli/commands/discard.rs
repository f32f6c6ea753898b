//! `rangedl discard <destination>` – drop saved progress.

use anyhow::{Context, Result};
use rangedl_core::storage;
use std::path::Path;

pub fn run_discard(destination: &Path) -> Result<()> {
    storage::discard(destination)
        .with_context(|| format!("discarding state for {}", destination.display()))?;
    tracing::debug!(destination = %destination.display(), "discarded temp file and ledger");
    println!("Discarded saved progress for {}", destination.display());
    Ok(())
}
