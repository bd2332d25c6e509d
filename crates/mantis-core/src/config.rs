use crate::rest::{
    retry_status_tester, CurlTransport, StatusCodeTester, DEFAULT_RETRY_AFTER_STATUS_CODES,
    DEFAULT_RETRY_STATUS_CODES, RETRY_AFTER,
};
use crate::retry::{Backoff, DEFAULT_ATTEMPTS, DEFAULT_BACKOFF};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backoff shape between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Constant,
    Exponential,
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Retries after the first try; total sends are `attempts + 1`.
    pub attempts: u32,
    pub backoff: BackoffKind,
    /// Constant delay, or the unit for exponential backoff.
    pub delay_ms: u64,
    /// Cap for the exponential random exponent.
    pub max_exponent: u32,
    /// Statuses that trigger another attempt.
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: BackoffKind::Constant,
            delay_ms: DEFAULT_BACKOFF.as_millis() as u64,
            max_exponent: 5,
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.to_vec(),
        }
    }
}

impl RetrySection {
    pub fn backoff(&self) -> Backoff {
        let unit = Duration::from_millis(self.delay_ms);
        match self.backoff {
            BackoffKind::Constant => Backoff::constant(unit),
            BackoffKind::Exponential => Backoff::exponential_random(unit, self.max_exponent),
        }
    }

    pub fn tester(&self) -> StatusCodeTester {
        retry_status_tester(self.retry_status_codes.iter().copied())
    }
}

/// `[retry_after]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryAfterSection {
    pub enabled: bool,
    pub status_codes: Vec<u16>,
    pub header: String,
}

impl Default for RetryAfterSection {
    fn default() -> Self {
        Self {
            enabled: false,
            status_codes: DEFAULT_RETRY_AFTER_STATUS_CODES.to_vec(),
            header: RETRY_AFTER.to_string(),
        }
    }
}

/// `[throttle]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleSection {
    /// Minimum spacing between sends; unset disables throttling.
    pub interval_ms: Option<u64>,
}

impl ThrottleSection {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

/// `[transport]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 300,
        }
    }
}

impl TransportSection {
    pub fn curl(&self) -> CurlTransport {
        CurlTransport::new()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Global configuration loaded from `~/.config/mantis/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MantisConfig {
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub retry_after: RetryAfterSection,
    #[serde(default)]
    pub throttle: ThrottleSection,
    #[serde(default)]
    pub transport: TransportSection,
}

impl MantisConfig {
    /// Tester for the retry requester. With Retry-After handling on, the
    /// trigger statuses are passed through as successes so the hint handler
    /// sees them on first sight instead of after the retry budget.
    pub fn retry_tester(&self) -> StatusCodeTester {
        let tester = self.retry.tester();
        if self.retry_after.enabled {
            tester.succeed_on(self.retry_after.status_codes.iter().copied())
        } else {
            tester
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mantis")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MantisConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<MantisConfig> {
    if !path.exists() {
        let default_cfg = MantisConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MantisConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
