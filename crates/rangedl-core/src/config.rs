use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per block within one session run (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/rangedl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Size in bytes of each block when the server honors range requests.
    pub block_size: u64,
    /// Number of concurrent block workers.
    pub concurrency: usize,
    /// Bytes buffered per positioned write / progress update.
    pub chunk_size: usize,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Abort a request when no bytes arrive for this many seconds.
    pub read_timeout_secs: u64,
    /// Minimum interval between sidecar flushes caused by progress updates alone.
    pub progress_flush_millis: u64,
    /// Optional User-Agent header; curl's default is used when unset.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            block_size: 1024 * 1024,
            concurrency: 3,
            chunk_size: 512 * 1024,
            connect_timeout_secs: 60,
            read_timeout_secs: 60,
            progress_flush_millis: 500,
            user_agent: None,
            retry: None,
        }
    }
}

impl DownloaderConfig {
    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            anyhow::bail!("block_size must be greater than 0");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn progress_flush_interval(&self) -> Duration {
        Duration::from_millis(self.progress_flush_millis)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rangedl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DownloaderConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DownloaderConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DownloaderConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
