/*
[INPUT]:  Deployment settings (YAML section or code)
[OUTPUT]: Validated AuthConfig with derived durations
[POS]:    Server layer - authenticator configuration
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by `AuthConfig::validate`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },
}

/// Upper bound for `ttl_seconds` and `clock_skew_seconds`
pub const MAX_WINDOW_SECONDS: u64 = 86_400;

/// Authenticator configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Server identifier placed in `serverId`
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Server origin placed in `aud`
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Challenge lifetime
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Require `bind` to match the request method and path
    #[serde(default = "default_bind_method_path")]
    pub bind_method_path: bool,
    /// Tolerated clock difference between client and server
    #[serde(default = "default_clock_skew_seconds")]
    pub clock_skew_seconds: u64,
    /// Paths served without authentication (exact match)
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Maximum replay records held in memory
    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: usize,
    /// Upper bound on a single replay-store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            audience: default_audience(),
            ttl_seconds: default_ttl_seconds(),
            bind_method_path: default_bind_method_path(),
            clock_skew_seconds: default_clock_skew_seconds(),
            excluded_paths: Vec::new(),
            replay_capacity: default_replay_capacity(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

fn default_issuer() -> String {
    "openkitx403".to_string()
}

fn default_audience() -> String {
    "http://localhost:8000".to_string()
}

fn default_ttl_seconds() -> u64 {
    60
}

fn default_bind_method_path() -> bool {
    true
}

fn default_clock_skew_seconds() -> u64 {
    30
}

fn default_replay_capacity() -> usize {
    100_000
}

fn default_store_timeout_ms() -> u64 {
    500
}

impl AuthConfig {
    /// Config for the given audience and issuer, defaults elsewhere
    pub fn new(audience: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    pub fn with_excluded_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::Empty("issuer"));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::Empty("audience"));
        }
        if self.ttl_seconds == 0 {
            return Err(ConfigError::Zero("ttl_seconds"));
        }
        for (field, value) in [
            ("ttl_seconds", self.ttl_seconds),
            ("clock_skew_seconds", self.clock_skew_seconds),
        ] {
            if value > MAX_WINDOW_SECONDS {
                return Err(ConfigError::TooLarge {
                    field,
                    max: MAX_WINDOW_SECONDS,
                });
            }
        }
        if self.replay_capacity == 0 {
            return Err(ConfigError::Zero("replay_capacity"));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Zero("store_timeout_ms"));
        }
        Ok(())
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(saturating_i64(self.ttl_seconds))
    }

    pub fn clock_skew(&self) -> chrono::Duration {
        chrono::Duration::seconds(saturating_i64(self.clock_skew_seconds))
    }

    /// How long a consumed nonce is remembered: the challenge lifetime plus
    /// skew on both ends, so a record outlives its challenge's validity.
    pub fn replay_ttl(&self) -> Duration {
        Duration::from_secs(
            self.ttl_seconds
                .saturating_add(self.clock_skew_seconds.saturating_mul(2)),
        )
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|excluded| excluded == path)
    }
}

/// Clamp to the range `chrono::Duration::seconds` accepts
fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1000)
}
