// src/config.rs
//
// Hub configuration, read once at startup.
// Every field has a default; a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppResult;

/// Overrides the config file location
pub const CONFIG_ENV_VAR: &str = "HUEVIFY_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// SQLite file; the platform data directory when unset
    pub database_path: Option<PathBuf>,
    /// Seconds between APPROVED -> LIVE sweeps
    pub publish_interval_secs: u64,
    /// Seconds between ambient accrual / chart checks
    pub ambient_poll_secs: u64,
    /// Wall-clock minute at which the hourly ambient accrual fires
    pub ambient_tick_minute: u32,
    /// UTC hour of the daily chart rollover
    pub chart_cutover_hour_utc: u32,
    pub chart_size: usize,
    /// Seconds of continuous listening before a play is credited
    pub listen_threshold_secs: f64,
    /// Progress jumps at or above this are seeks, not listening
    pub max_progress_gap_secs: f64,
    pub recent_history_len: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            publish_interval_secs: 60,
            ambient_poll_secs: 30,
            ambient_tick_minute: 0,
            // 00:00 at UTC+3
            chart_cutover_hour_utc: 21,
            chart_size: 25,
            listen_threshold_secs: 30.0,
            max_progress_gap_secs: 1.5,
            recent_history_len: 10,
        }
    }
}

impl HubConfig {
    /// `$HUEVIFY_CONFIG`, else `<config dir>/huevify/hub.toml`
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("huevify").join("hub.toml"))
    }

    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = Self::from_toml(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: HubConfig = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Clamp values that would make the scheduler spin or never fire
    fn normalized(mut self) -> Self {
        self.publish_interval_secs = self.publish_interval_secs.max(1);
        self.ambient_poll_secs = self.ambient_poll_secs.max(1);
        self.ambient_tick_minute %= 60;
        self.chart_cutover_hour_utc %= 24;
        self
    }
}
