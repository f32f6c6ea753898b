//! Single-block HTTP Range GET, streamed into the temp file.
//!
//! Bytes are collected into `chunk_size` chunks; each chunk is written at its
//! absolute offset, recorded in the ledger and reported to the listener before
//! the cancel token is checked again.
//!
//! Progress is recorded once a chunk's write returns, not once it is synced;
//! only a completed block is synced before it is marked done. After a power
//! loss the ledger may claim bytes of a pending block that never reached the
//! disk, so resumed partial blocks are eventually durable rather than exact.

mod error;

pub use error::BlockError;

use std::cell::Cell;
use std::path::Path;

use crate::control::CancelToken;
use crate::http::{self, HttpOptions};
use crate::ledger::{Claim, Ledger};
use crate::notify::DownloadListener;
use crate::storage::BlockWriter;

/// Everything a fetch needs besides the claim itself.
pub struct FetchContext<'a> {
    pub url: &'a str,
    pub destination: &'a Path,
    pub temp_path: &'a Path,
    pub total_length: u64,
    pub chunk_size: usize,
    pub http: &'a HttpOptions,
    pub ledger: &'a Ledger,
    pub listener: &'a dyn DownloadListener,
    pub cancel: &'a CancelToken,
}

/// How a fetch ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Window fully written; the block is Done.
    Completed,
    /// Cancel token observed; the block was released with its progress kept.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Window filled; the server kept sending.
    WindowFull,
    Cancelled,
    BadStatus(u32),
}

/// Receives body bytes for one claim and writes them chunk by chunk.
struct BlockSink<'a> {
    ctx: &'a FetchContext<'a>,
    index: usize,
    writer: BlockWriter,
    /// Absolute offset of the first byte in `buf`.
    offset: u64,
    end: u64,
    /// Body bytes to drop before the window starts (200 reply to a ranged request).
    skip: u64,
    started: bool,
    buf: Vec<u8>,
    stop: Option<Stop>,
    error: Option<BlockError>,
}

impl<'a> BlockSink<'a> {
    fn new(ctx: &'a FetchContext<'a>, claim: Claim) -> std::io::Result<Self> {
        Ok(Self {
            ctx,
            index: claim.index,
            writer: BlockWriter::open(ctx.temp_path)?,
            offset: claim.start,
            end: claim.end,
            skip: 0,
            started: false,
            buf: Vec::with_capacity(ctx.chunk_size),
            stop: None,
            error: None,
        })
    }

    /// Write the buffered chunk, record progress and notify.
    fn flush(&mut self) -> Result<(), BlockError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.writer.write_at(self.offset, &self.buf)?;
        self.offset += self.buf.len() as u64;
        self.buf.clear();
        let current = self.ctx.ledger.update_progress(self.index, self.offset)?;
        self.ctx.listener.on_progress(
            self.ctx.url,
            self.ctx.destination,
            current,
            self.ctx.total_length,
            false,
        );
        Ok(())
    }

    /// Body callback. Returns how many bytes curl should consider consumed;
    /// anything short of `data.len()` aborts the transfer.
    fn receive(&mut self, status: u32, data: &[u8]) -> usize {
        if !self.started {
            self.started = true;
            match status {
                206 => {}
                // The server ignored the range; the body starts at offset 0.
                200 => self.skip = self.offset,
                code => {
                    self.stop = Some(Stop::BadStatus(code));
                    return 0;
                }
            }
        }

        let mut body = data;
        if self.skip > 0 {
            let n = self.skip.min(body.len() as u64) as usize;
            body = &body[n..];
            self.skip -= n as u64;
        }

        while !body.is_empty() {
            let room = self.end - self.offset - self.buf.len() as u64;
            if room == 0 {
                self.stop = Some(Stop::WindowFull);
                return 0;
            }
            let want = self.ctx.chunk_size - self.buf.len();
            let take = body.len().min(want).min(room as usize);
            self.buf.extend_from_slice(&body[..take]);
            body = &body[take..];

            let window_filled = self.offset + self.buf.len() as u64 == self.end;
            if self.buf.len() >= self.ctx.chunk_size || window_filled {
                if let Err(e) = self.flush() {
                    self.error = Some(e);
                    return 0;
                }
                if self.ctx.cancel.is_cancelled() {
                    self.stop = Some(Stop::Cancelled);
                    return 0;
                }
            }
        }
        data.len()
    }
}

/// Fetches the claimed window, then marks the block done or releases it.
///
/// On success the block is Done. On cancellation or error the block is back to
/// Pending with whatever progress reached the disk. Curl and file handles are
/// dropped before this returns.
pub fn fetch_block(ctx: &FetchContext<'_>, claim: Claim) -> Result<FetchOutcome, BlockError> {
    let result = if claim.is_empty() {
        Ok(FetchOutcome::Completed)
    } else if ctx.cancel.is_cancelled() {
        Ok(FetchOutcome::Cancelled)
    } else {
        transfer(ctx, claim)
    };

    match result {
        Ok(FetchOutcome::Completed) => {
            if let Err(e) = ctx.ledger.mark_done(claim.index) {
                release(ctx, claim.index);
                return Err(e.into());
            }
            tracing::debug!(index = claim.index, "block done");
            Ok(FetchOutcome::Completed)
        }
        Ok(FetchOutcome::Cancelled) => {
            release(ctx, claim.index);
            tracing::debug!(index = claim.index, "block released on cancel");
            Ok(FetchOutcome::Cancelled)
        }
        Err(e) => {
            release(ctx, claim.index);
            tracing::warn!(index = claim.index, error = %e, "block released after failure");
            Err(e)
        }
    }
}

fn release(ctx: &FetchContext<'_>, index: usize) {
    if let Err(e) = ctx.ledger.release(index) {
        tracing::warn!(index, error = %e, "could not persist block release");
    }
}

fn transfer(ctx: &FetchContext<'_>, claim: Claim) -> Result<FetchOutcome, BlockError> {
    let status = Cell::new(0u32);
    let mut sink = BlockSink::new(ctx, claim)?;

    tracing::debug!(index = claim.index, range = %claim.range_header_value(), "requesting block");
    let mut easy = ctx.http.easy(ctx.url)?;
    easy.range(&claim.range_spec())?;
    easy.progress(true)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Some(code) = std::str::from_utf8(data)
                .ok()
                .and_then(|l| http::status_from_line(l.trim_end()))
            {
                status.set(code);
            }
            true
        })?;
        transfer.write_function(|data| Ok(sink.receive(status.get(), data)))?;
        // Lets a stalled connection notice cancellation between body callbacks.
        transfer.progress_function(|_, _, _, _| !ctx.cancel.is_cancelled())?;
        transfer.perform()
    };

    if let Some(e) = sink.error.take() {
        return Err(e);
    }
    match (performed, sink.stop) {
        (_, Some(Stop::BadStatus(code))) => return Err(BlockError::Http(code)),
        (_, Some(Stop::Cancelled)) => {
            sink.flush()?;
            return Ok(FetchOutcome::Cancelled);
        }
        (Err(e), None) if e.is_aborted_by_callback() && ctx.cancel.is_cancelled() => {
            sink.flush()?;
            return Ok(FetchOutcome::Cancelled);
        }
        (Err(e), None) => {
            // Bytes received before the connection broke are still valid.
            sink.flush()?;
            return Err(BlockError::Curl(e));
        }
        (Ok(()), _) | (Err(_), Some(Stop::WindowFull)) => {}
    }

    let code = easy.response_code()?;
    if code != 206 && code != 200 {
        return Err(BlockError::Http(code));
    }
    sink.flush()?;
    if sink.offset < sink.end {
        return Err(BlockError::PartialTransfer {
            expected: claim.len(),
            received: sink.offset - claim.start,
        });
    }
    // A block is only marked Done once its bytes are on disk.
    sink.writer.sync()?;
    Ok(FetchOutcome::Completed)
}
