//! Configuration for the tracking system.
//!
//! Loaded from TOML. Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [orders]
//! id_prefix = "ORD"
//! id_start = 1200
//!
//! [directory]
//! max_page_size = 100
//!
//! [channel]
//! backoff_base_ms = 500
//! backoff_max_ms = 30000
//! max_reconnect_attempts = 5
//!
//! [session]
//! snapshot_timeout_ms = 10000
//! snapshot_attempts = 3
//! poll_interval_ms = 15000
//! snapshot_backoff_base_ms = 1000
//! snapshot_backoff_max_ms = 8000
//! ```

use crate::channel::Backoff;
use crate::directory::DEFAULT_MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the configuration file read by the binary.
pub const CONFIG_ENV_VAR: &str = "PARCEL_TRACKING_CONFIG";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error that occurs during file I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error that occurs when parsing TOML configuration.
    #[error("Configuration error: {0}")]
    Parse(String),
    /// Error that occurs when configuration validation fails.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.message().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Order actor settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrdersConfig {
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Number of the first order id handed out.
    #[serde(default = "default_id_start")]
    pub id_start: u64,
    /// Capacity of the actor's request queue.
    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,
    /// Capacity of the change feed. Slower subscribers see a lag and resynchronise.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

fn default_id_prefix() -> String {
    "ORD".to_string()
}

fn default_id_start() -> u64 {
    1200
}

fn default_mailbox_size() -> usize {
    32
}

fn default_feed_capacity() -> usize {
    256
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            id_start: default_id_start(),
            mailbox_size: default_mailbox_size(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
        }
    }
}

/// Live update channel settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// First reconnect delay. Doubles per consecutive failure.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound for any single reconnect delay.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Consecutive failures after which subscribers are told to fall back to polling.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Updates buffered per subscription before the channel waits on the consumer.
    #[serde(default = "default_update_buffer")]
    pub update_buffer: usize,
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_update_buffer() -> usize {
    64
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            update_buffer: default_update_buffer(),
        }
    }
}

impl ChannelConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

/// Tracking session settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_snapshot_timeout_ms")]
    pub snapshot_timeout_ms: u64,
    /// Snapshot fetches before the session reports tracking as unavailable.
    #[serde(default = "default_snapshot_attempts")]
    pub snapshot_attempts: u32,
    /// Snapshot polling period while the live channel is degraded.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay before the second snapshot attempt. Doubles per further attempt.
    #[serde(default = "default_snapshot_backoff_base_ms")]
    pub snapshot_backoff_base_ms: u64,
    #[serde(default = "default_snapshot_backoff_max_ms")]
    pub snapshot_backoff_max_ms: u64,
    /// Events held back while waiting for a missing sequence.
    #[serde(default = "default_reorder_buffer")]
    pub reorder_buffer: usize,
}

fn default_snapshot_timeout_ms() -> u64 {
    10_000
}

fn default_snapshot_attempts() -> u32 {
    3
}

fn default_poll_interval_ms() -> u64 {
    15_000
}

fn default_snapshot_backoff_base_ms() -> u64 {
    1_000
}

fn default_snapshot_backoff_max_ms() -> u64 {
    8_000
}

fn default_reorder_buffer() -> usize {
    32
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snapshot_timeout_ms: default_snapshot_timeout_ms(),
            snapshot_attempts: default_snapshot_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            snapshot_backoff_base_ms: default_snapshot_backoff_base_ms(),
            snapshot_backoff_max_ms: default_snapshot_backoff_max_ms(),
            reorder_buffer: default_reorder_buffer(),
        }
    }
}

impl SessionConfig {
    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn snapshot_backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.snapshot_backoff_base_ms),
            Duration::from_millis(self.snapshot_backoff_max_ms),
        )
    }
}

impl TrackingConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Reads the file named by [`CONFIG_ENV_VAR`], or returns defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orders.id_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "orders.id_prefix must not be empty".into(),
            ));
        }
        if self.orders.mailbox_size == 0 || self.orders.feed_capacity == 0 {
            return Err(ConfigError::Validation(
                "orders.mailbox_size and orders.feed_capacity must be positive".into(),
            ));
        }
        if self.directory.max_page_size == 0 {
            return Err(ConfigError::Validation(
                "directory.max_page_size must be positive".into(),
            ));
        }
        if self.channel.backoff_base_ms == 0 {
            return Err(ConfigError::Validation(
                "channel.backoff_base_ms must be positive".into(),
            ));
        }
        if self.channel.backoff_max_ms < self.channel.backoff_base_ms {
            return Err(ConfigError::Validation(format!(
                "channel.backoff_max_ms ({}) is below channel.backoff_base_ms ({})",
                self.channel.backoff_max_ms, self.channel.backoff_base_ms
            )));
        }
        if self.channel.max_reconnect_attempts == 0 || self.channel.update_buffer == 0 {
            return Err(ConfigError::Validation(
                "channel.max_reconnect_attempts and channel.update_buffer must be positive".into(),
            ));
        }
        if self.session.snapshot_attempts == 0 {
            return Err(ConfigError::Validation(
                "session.snapshot_attempts must be positive".into(),
            ));
        }
        if self.session.snapshot_backoff_max_ms < self.session.snapshot_backoff_base_ms {
            return Err(ConfigError::Validation(format!(
                "session.snapshot_backoff_max_ms ({}) is below session.snapshot_backoff_base_ms ({})",
                self.session.snapshot_backoff_max_ms, self.session.snapshot_backoff_base_ms
            )));
        }
        if self.session.snapshot_timeout_ms == 0 || self.session.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "session.snapshot_timeout_ms and session.poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl FromStr for TrackingConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: TrackingConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: TrackingConfig = "".parse().unwrap();
        assert_eq!(config, TrackingConfig::default());
        assert_eq!(config.orders.id_start, 1200);
        assert_eq!(config.directory.max_page_size, 100);
        assert_eq!(config.channel.backoff_base(), Duration::from_millis(500));
        assert_eq!(config.channel.backoff_max(), Duration::from_secs(30));
        assert_eq!(config.channel.max_reconnect_attempts, 5);
        assert_eq!(config.session.snapshot_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.snapshot_attempts, 3);
        assert_eq!(config.session.poll_interval(), Duration::from_secs(15));
        assert_eq!(
            config.session.snapshot_backoff().delay(2),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: TrackingConfig = r#"
            [orders]
            id_prefix = "PKG"

            [channel]
            max_reconnect_attempts = 2
        "#
        .parse()
        .unwrap();
        assert_eq!(config.orders.id_prefix, "PKG");
        assert_eq!(config.orders.id_start, 1200);
        assert_eq!(config.channel.max_reconnect_attempts, 2);
        assert_eq!(config.channel.backoff_base_ms, 500);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = "[channel\nbackoff_base_ms = 1".parse::<TrackingConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = "[session]\nsnapshot_attempts = \"three\""
            .parse::<TrackingConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn inconsistent_values_fail_validation() {
        let err = "[channel]\nbackoff_base_ms = 1000\nbackoff_max_ms = 10"
            .parse::<TrackingConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("backoff_max_ms")));

        let err = "[directory]\nmax_page_size = 0"
            .parse::<TrackingConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TrackingConfig::from_file("/nonexistent/parcel-tracking.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
