//! Map block transfer failures onto retry `ErrorKind`s.

use crate::fetch::BlockError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code received for a block request.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl transport error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

pub fn classify(e: &BlockError) -> ErrorKind {
    match e {
        BlockError::Curl(ce) => classify_curl_error(ce),
        BlockError::Http(code) => classify_http_status(*code),
        BlockError::PartialTransfer { .. } => ErrorKind::Connection,
        BlockError::Storage(_) | BlockError::Ledger(_) => ErrorKind::Other,
    }
}
