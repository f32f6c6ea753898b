//! Range-support probing.
//!
//! Sends one `GET` with `Range: bytes=1-` and reads only the response head.
//! A 206 reply means the server honors ranges; a 200 reply means it ignored the
//! header and the download must run as a single block.

mod parse;

use std::str;

use crate::http::HttpOptions;

/// What the probe learned about the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Range requests are honored.
    Resumable { total_length: u64 },
    /// Range requests are ignored; the resource can only be fetched whole.
    NotResumable { total_length: u64 },
}

impl ProbeOutcome {
    pub fn total_length(&self) -> u64 {
        match *self {
            ProbeOutcome::Resumable { total_length } | ProbeOutcome::NotResumable { total_length } => {
                total_length
            }
        }
    }

    pub fn is_resumable(&self) -> bool {
        matches!(self, ProbeOutcome::Resumable { .. })
    }
}

/// The resource is unavailable for download.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe request failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("probe returned HTTP {0}")]
    Status(u32),
    #[error("probe returned HTTP {0} without a usable length")]
    MissingLength(u32),
}

/// Probes `url` for total length and range support.
///
/// Runs in the current thread. The transfer is cut off at the first body byte
/// and the handle is dropped before returning, so no connection stays open.
pub fn probe(url: &str, opts: &HttpOptions) -> Result<ProbeOutcome, ProbeError> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = opts.easy(url)?;
    easy.range("1-")?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                lines.push(s.trim_end().to_string());
            }
            true
        })?;
        // Returning 0 aborts the transfer: the body is not needed.
        transfer.write_function(|_| Ok(0))?;
        transfer.perform()
    };
    if let Err(e) = performed {
        if !e.is_write_error() {
            tracing::debug!(url, error = %e, "probe transport failure");
            return Err(ProbeError::Transport(e));
        }
    }

    let head = parse::parse_head(&lines);
    let outcome = parse::interpret(&head);
    match &outcome {
        Ok(o) => tracing::debug!(url, status = head.status, ?o, "probe ok"),
        Err(e) => tracing::debug!(url, status = head.status, error = %e, "probe rejected"),
    }
    outcome
}
