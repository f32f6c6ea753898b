//! Positioned writer for the shared temp file.

use std::fs::File;
use std::io;
use std::path::Path;
#[cfg(unix)]
use std::os::unix::fs::FileExt;

/// Write handle owned by a single block fetch.
///
/// Every fetch opens its own handle, so concurrent workers never share a seek
/// cursor; writes land at absolute offsets and blocks never overlap.
pub struct BlockWriter {
    file: File,
}

impl BlockWriter {
    /// Open the existing temp file for writing (no truncation).
    pub fn open(temp_path: &Path) -> io::Result<Self> {
        let file = File::options().write(true).open(temp_path)?;
        Ok(Self { file })
    }

    /// Write all of `data` at `offset` without touching other ranges.
    #[cfg(unix)]
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.file.write_all_at(data, offset)
    }

    /// Non-Unix: seek + write on this fetch's own handle.
    #[cfg(not(unix))]
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        use std::io::{Seek, SeekFrom, Write};
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)
    }

    /// Flush written data to disk.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_data()
    }
}
