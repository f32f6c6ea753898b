//! Shared curl handle settings for probe and block requests.

use std::time::Duration;

use crate::config::DownloaderConfig;

/// Abort a transfer when throughput stays below this many bytes/s for `read_timeout`.
const LOW_SPEED_LIMIT: u32 = 1;

/// Per-request connection settings.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Acts as a read timeout: a request that receives nothing for this long is aborted.
    pub read_timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(60),
            user_agent: None,
        }
    }
}

impl HttpOptions {
    pub fn from_config(cfg: &DownloaderConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            read_timeout: cfg.read_timeout(),
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// Builds a GET handle for `url` with redirects, timeouts and a fresh connection.
    pub(crate) fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(LOW_SPEED_LIMIT)?;
        easy.low_speed_time(self.read_timeout)?;
        // Connections are not reused across requests.
        easy.forbid_reuse(true)?;
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        Ok(easy)
    }
}

/// Status code from an HTTP status line (`HTTP/1.1 206 Partial Content`).
pub(crate) fn status_from_line(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("HTTP/")?;
    rest.split_whitespace().nth(1)?.parse().ok()
}
