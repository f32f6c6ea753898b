//! `rangedl status <destination>` – show saved block progress.

use anyhow::Result;
use rangedl_core::ledger::{BlockStatus, Ledger};
use rangedl_core::storage;
use std::path::Path;

pub fn run_status(destination: &Path) -> Result<()> {
    let ledger_path = storage::ledger_path(destination);
    let Some(snapshot) = Ledger::load(&ledger_path) else {
        println!("No download in progress for {}", destination.display());
        return Ok(());
    };

    let done = snapshot.count(BlockStatus::Done);
    let total_blocks = snapshot.blocks.len();
    let bytes = snapshot.bytes_done();
    let pct = if snapshot.total_length == 0 {
        100.0
    } else {
        bytes as f64 * 100.0 / snapshot.total_length as f64
    };
    println!("{}", destination.display());
    println!(
        "  blocks: {done}/{total_blocks} done (block size {})",
        snapshot.block_size
    );
    println!("  bytes:  {bytes}/{} ({pct:.1}%)", snapshot.total_length);

    println!("{:<6} {:<8} {:>14} {:>14}", "BLOCK", "STATE", "WRITTEN", "SIZE");
    for (i, b) in snapshot.blocks.iter().enumerate() {
        if b.status == BlockStatus::Done {
            continue;
        }
        println!(
            "{:<6} {:<8} {:>14} {:>14}",
            i,
            format!("{:?}", b.status).to_lowercase(),
            b.bytes_done(),
            b.len()
        );
    }
    Ok(())
}
