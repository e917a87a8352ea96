use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default body read buffer: 16 KiB.
pub const DEFAULT_READ_BUFFER_BYTES: usize = 16 * 1024;

/// Global configuration loaded from `~/.config/streamdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Capacity of the buffer each body read fills. One read becomes one chunk.
    pub read_buffer_bytes: usize,
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds (0 = none).
    pub timeout_secs: u64,
    /// Abort when the transfer stays below this many bytes/sec ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Maximum redirects to follow.
    pub max_redirections: u32,
    /// Body buffers queued between the curl thread and the reader.
    pub body_queue_depth: usize,
    /// Optional `User-Agent` sent by the curl transport.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: DEFAULT_READ_BUFFER_BYTES,
            connect_timeout_secs: 30,
            timeout_secs: 0,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
            body_queue_depth: 16,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("streamdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit file. Missing keys take defaults.
pub fn load_from(path: &Path) -> Result<FetchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: FetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
