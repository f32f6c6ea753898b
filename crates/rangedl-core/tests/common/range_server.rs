//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body to `GET`, honoring `Range: bytes=a-b` unless
//! told not to. Every request's Range header is logged so tests can assert
//! which byte ranges were actually fetched.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If set, every request gets this status and an empty body.
    pub fixed_status: Option<u16>,
    /// If set, bodies are cut off after this many bytes while the advertised
    /// Content-Length stays complete.
    pub truncate_after: Option<usize>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            fixed_status: None,
            truncate_after: None,
        }
    }
}

/// A running test server.
pub struct RangeServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Option<String>>>>,
}

impl RangeServer {
    /// Range header value of every request served so far, in arrival order.
    pub fn ranges(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }

    /// Ranged requests other than the `bytes=1-` probe.
    pub fn block_ranges(&self) -> Vec<String> {
        self.ranges()
            .into_iter()
            .flatten()
            .filter(|r| r != "bytes=1-")
            .collect()
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{port}/file.bin"),
        requests,
    }
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf).ok()
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    log: &Mutex<Vec<Option<String>>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(request) = read_head(&mut stream) else {
        return;
    };
    let (method, range_value) = parse_request(&request);
    log.lock().unwrap().push(range_value.clone());

    if let Some(code) = opts.fixed_status {
        let response =
            format!("HTTP/1.1 {code} Test\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let total = body.len() as u64;
    let range = range_value.as_deref().and_then(parse_range);
    let (status, content_range, slice) = match range {
        Some((start, end_incl)) if opts.support_ranges => {
            if start >= total {
                ("416 Range Not Satisfiable", Some(format!("bytes */{total}")), &body[0..0])
            } else {
                let end_incl = end_incl.min(total - 1);
                let slice = &body[start as usize..=end_incl as usize];
                (
                    "206 Partial Content",
                    Some(format!("bytes {start}-{end_incl}/{total}")),
                    slice,
                )
            }
        }
        _ => ("200 OK", None, body),
    };

    let mut head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
        slice.len()
    );
    if let Some(cr) = content_range {
        head.push_str(&format!("Content-Range: {cr}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());

    let sent = match opts.truncate_after {
        Some(n) => &slice[..n.min(slice.len())],
        None => slice,
    };
    let _ = stream.write_all(sent);
    let _ = stream.flush();
}

/// Returns the method and the raw Range header value, if any.
fn parse_request(request: &str) -> (String, Option<String>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("")
        .to_string();
    let range = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("range"))
        .map(|(_, value)| value.trim().to_string());
    (method, range)
}

/// `bytes=a-b` → `(a, b)`; `bytes=a-` → `(a, u64::MAX)`.
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let spec = value.strip_prefix("bytes=")?;
    let (a, b) = spec.split_once('-')?;
    let start = a.trim().parse().ok()?;
    let end = match b.trim() {
        "" => u64::MAX,
        b => b.parse().ok()?,
    };
    Some((start, end))
}
