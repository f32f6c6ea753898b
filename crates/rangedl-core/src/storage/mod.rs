//! Disk I/O and file lifecycle for one destination.
//!
//! Bytes accumulate in `<destination>.tmp` at their final offsets; the block
//! ledger lives beside it in `<destination>.cfg`. Each fetch writes through its
//! own `BlockWriter` handle with positioned writes, and the temp file is
//! promoted to the destination by rename once the size checks out.

mod writer;

pub use writer::BlockWriter;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".tmp";
/// Sidecar ledger suffix.
pub const LEDGER_SUFFIX: &str = ".cfg";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

/// Path for the temp file: `file.iso` → `file.iso.tmp`.
pub fn temp_path(destination: &Path) -> PathBuf {
    with_suffix(destination, TEMP_SUFFIX)
}

/// Path for the sidecar ledger: `file.iso` → `file.iso.cfg`.
pub fn ledger_path(destination: &Path) -> PathBuf {
    with_suffix(destination, LEDGER_SUFFIX)
}

/// Creates the directory `path` will live in, if it has one.
pub fn create_parent_dirs(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Creates the temp file (and its directory) if missing. Existing bytes are kept.
pub fn ensure_temp_file(temp: &Path) -> io::Result<()> {
    create_parent_dirs(temp)?;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(temp)?;
    Ok(())
}

/// Current size of the file at `path`.
pub fn file_len(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}

/// Flushes file contents to disk.
pub fn sync_file(path: &Path) -> io::Result<()> {
    fs::File::open(path)?.sync_all()
}

/// Moves `temp` to `destination`, creating parent directories and replacing any existing file.
pub fn promote(temp: &Path, destination: &Path) -> io::Result<()> {
    create_parent_dirs(destination)?;
    remove_if_exists(destination)?;
    fs::rename(temp, destination)
}

/// Removes a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Deletes the temp file and ledger for `destination`, abandoning any progress.
pub fn discard(destination: &Path) -> io::Result<()> {
    remove_if_exists(&temp_path(destination))?;
    remove_if_exists(&ledger_path(destination))
}
