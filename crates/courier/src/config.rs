use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use courier_transfer::RetryPolicy;
use courier_transfer::data::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use courier_transfer::effects::{DEFAULT_POLL_INTERVAL, DEFAULT_UPLOAD_TIMEOUT};
use courier_verify::ChecksumAlgorithm;
use serde::Deserialize;

/// Seconds; overrides `[upload] timeout_secs`.
pub const TIMEOUT_ENV: &str = "COURIER_TIMEOUT";

/// Settings read from the optional `--config` TOML file.
///
/// ```toml
/// user_agent = "my-pipeline/1.0"
///
/// [retry]
/// max_attempts = 6
/// initial_delay_ms = 250
/// max_delay_ms = 4000
///
/// [upload]
/// poll_interval_ms = 1000
/// timeout_secs = 900
/// checksum = "sha256"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub user_agent: Option<String>,
    pub retry:      RetryConfig,
    pub upload:     UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts:     u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms:     u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts:     DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_delay_ms:     DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub poll_interval_ms: u64,
    /// Zero disables the deadline.
    pub timeout_secs:     u64,
    pub checksum:         ChecksumAlgorithm,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            timeout_secs:     DEFAULT_UPLOAD_TIMEOUT.as_secs(),
            checksum:         ChecksumAlgorithm::default(),
        }
    }
}

impl UploadConfig {
    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }

    pub fn timeout(&self) -> Option<Duration> { (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)) }
}

impl Config {
    /// Defaults, then the file at `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_timeout_override(std::env::var(TIMEOUT_ENV).ok().as_deref())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }

    fn apply_timeout_override(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
            self.upload.timeout_secs = value
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} must be a whole number of seconds, got {value:?}"))?;
        }
        Ok(())
    }
}
