use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::SyncError;
use crate::schedule::{Backoff, Schedule};

type Result<T> = anyhow::Result<T>;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub identity_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            event_buffer_size: default_event_buffer_size(),
            poll: PollConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            identity_path: None,
        }
    }
}

impl SyncConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("failed to deserialize sync config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), SyncError> {
        if self.api_base_url.trim().is_empty() {
            return Err(SyncError::Config("api_base_url must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(SyncError::Config(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(SyncError::Config(
                "event_buffer_size must be positive".to_string(),
            ));
        }
        if self.poll.interval_ms == 0 {
            return Err(SyncError::Config("poll.interval_ms must be positive".to_string()));
        }
        if self.poll.max_attempts == Some(0) {
            return Err(SyncError::Config(
                "poll.max_attempts must be positive when set".to_string(),
            ));
        }
        if let BackoffConfig::Exponential {
            factor,
            max_interval_ms,
        } = self.poll.backoff
        {
            if factor < 1 || max_interval_ms < self.poll.interval_ms {
                return Err(SyncError::Config(
                    "poll.backoff needs factor >= 1 and max_interval_ms >= interval_ms".to_string(),
                ));
            }
        }
        if self.leaderboard.refresh_interval_ms == 0 {
            return Err(SyncError::Config(
                "leaderboard.refresh_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll.interval_ms),
            max_attempts: self.poll.max_attempts,
            backoff: self.poll.backoff.into(),
        }
    }

    pub fn leaderboard_interval(&self) -> Duration {
        Duration::from_millis(self.leaderboard.refresh_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Unset means keep polling until a verdict or supersession.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: None,
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffConfig {
    #[default]
    Fixed,
    Exponential { factor: u32, max_interval_ms: u64 },
}

impl From<BackoffConfig> for Backoff {
    fn from(value: BackoffConfig) -> Self {
        match value {
            BackoffConfig::Fixed => Backoff::Fixed,
            BackoffConfig::Exponential {
                factor,
                max_interval_ms,
            } => Backoff::Exponential {
                factor,
                max_interval: Duration::from_millis(max_interval_ms),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_leaderboard_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_leaderboard_interval_ms(),
            display_limit: default_display_limit(),
        }
    }
}

/// How the status poll loop is paced and when it gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl Default for PollPolicy {
    fn default() -> Self {
        SyncConfig::default().poll_policy()
    }
}

impl PollPolicy {
    /// First query one interval after the submission is accepted.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            first_delay: self.interval,
            interval: self.interval,
            backoff: self.backoff,
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_event_buffer_size() -> usize {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_leaderboard_interval_ms() -> u64 {
    20_000
}

fn default_display_limit() -> usize {
    10
}
