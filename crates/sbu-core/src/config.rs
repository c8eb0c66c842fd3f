use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Whole-item retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per video (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff on server errors.
    pub backoff_unit_secs: u64,
    /// Fixed delay in seconds before retrying unclassified failures.
    pub flat_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit_secs: 5,
            flat_delay_secs: 5,
        }
    }
}

/// Global configuration loaded from `~/.config/sbu/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbuConfig {
    /// Daily API quota budget in units.
    pub daily_quota_limit: u64,
    /// Quota cost of one video upload.
    pub upload_cost: u64,
    /// Pause between queue items in seconds.
    pub settle_secs: u64,
    /// Default number of queue rows consumed per run.
    pub max_items: usize,
    /// Resumable upload chunk size in bytes.
    pub chunk_size_bytes: usize,
    /// Fixed UTC offset (hours) in which queue timestamps are written.
    pub source_utc_offset_hours: i32,
    /// Local wall-clock hour at which the remote quota resets.
    pub reset_hour_local: u32,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for SbuConfig {
    fn default() -> Self {
        Self {
            daily_quota_limit: 10_000,
            upload_cost: 1_600,
            settle_secs: 10,
            max_items: 5,
            chunk_size_bytes: crate::session::DEFAULT_CHUNK_SIZE,
            source_utc_offset_hours: 9,
            reset_hour_local: 17,
            retry: None,
        }
    }
}

impl SbuConfig {
    /// Effective retry policy: configured section or defaults.
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sbu")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// State directory for the quota ledger, run logs, and upload history.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sbu")?;
    Ok(xdg_dirs.get_state_home())
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SbuConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SbuConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SbuConfig = toml::from_str(&data)?;
    Ok(cfg)
}
