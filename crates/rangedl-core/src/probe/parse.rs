//! Parse the probe response head and decide resumability.

use super::{ProbeError, ProbeOutcome};

/// Status and length headers of the final response (after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ResponseHead {
    pub status: u32,
    pub content_length: Option<u64>,
    /// Complete length from `Content-Range: bytes a-b/TOTAL` or `bytes */TOTAL`.
    pub range_total: Option<u64>,
}

/// Parse a `Content-Range` value and return the complete length, if known.
fn content_range_total(value: &str) -> Option<u64> {
    let rest = value.trim().strip_prefix("bytes")?.trim_start();
    let (_, total) = rest.split_once('/')?;
    total.trim().parse().ok()
}

/// Parse collected header lines. Lines before the last status line belong to
/// redirects or interim responses and are ignored.
pub(crate) fn parse_head(lines: &[String]) -> ResponseHead {
    let start = lines
        .iter()
        .rposition(|l| crate::http::status_from_line(l).is_some())
        .unwrap_or(0);
    let mut head = ResponseHead::default();

    for line in &lines[start..] {
        let line = line.trim();
        if let Some(code) = crate::http::status_from_line(line) {
            head.status = code;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                head.content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("content-range") {
                head.range_total = content_range_total(value);
            }
        }
    }
    head
}

/// Interpret the answer to `GET` with `Range: bytes=1-`.
pub(crate) fn interpret(head: &ResponseHead) -> Result<ProbeOutcome, ProbeError> {
    match head.status {
        // The reply covers offset 1 onward, so the resource is one byte longer.
        206 => head
            .content_length
            .map(|len| len + 1)
            .or(head.range_total)
            .map(|total_length| ProbeOutcome::Resumable { total_length })
            .ok_or(ProbeError::MissingLength(206)),
        200 => head
            .content_length
            .map(|total_length| ProbeOutcome::NotResumable { total_length })
            .ok_or(ProbeError::MissingLength(200)),
        // Offset 1 is past the end of a 0- or 1-byte resource; the server still speaks ranges.
        416 => head
            .range_total
            .map(|total_length| ProbeOutcome::Resumable { total_length })
            .ok_or(ProbeError::Status(416)),
        code => Err(ProbeError::Status(code)),
    }
}
