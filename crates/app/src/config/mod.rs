use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use watcher::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONSUMER, DEFAULT_CRITICAL_THRESHOLD, DEFAULT_POLL_INTERVAL,
    WatcherConfig,
};

use crate::error::{AppError, Result};

pub const ENV_DB_PATH: &str = "CONTEXT_MONITOR_DB";
pub const ENV_HOST: &str = "CONTEXT_MONITOR_HOST";
pub const ENV_PORT: &str = "CONTEXT_MONITOR_PORT";
pub const ENV_POLL_INTERVAL: &str = "CONTEXT_MONITOR_POLL_INTERVAL";
pub const ENV_CRITICAL_THRESHOLD: &str = "CONTEXT_MONITOR_CRITICAL_THRESHOLD";
pub const ENV_BATCH_SIZE: &str = "CONTEXT_MONITOR_BATCH_SIZE";
pub const ENV_CHECKPOINT: &str = "CONTEXT_MONITOR_CHECKPOINT";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// Settings shared by the `serve` and `watch` commands. Loaded from a TOML
/// file, then overridden by environment variables and command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub poll_interval_secs: f64,
    pub critical_threshold: f64,
    pub batch_size: usize,
    pub checkpoint: bool,
    pub consumer: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs_f64(),
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            checkpoint: true,
            consumer: DEFAULT_CONSUMER.to_string(),
        }
    }
}

impl MonitorConfig {
    /// Applies overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_HOST).filter(|value| !value.trim().is_empty()) {
            self.host = value;
        }
        if let Some(value) = lookup(ENV_PORT) {
            self.port = parse_env(ENV_PORT, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL) {
            self.poll_interval_secs = parse_env(ENV_POLL_INTERVAL, &value)?;
        }
        if let Some(value) = lookup(ENV_CRITICAL_THRESHOLD) {
            self.critical_threshold = parse_env(ENV_CRITICAL_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_BATCH_SIZE) {
            self.batch_size = parse_env(ENV_BATCH_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_CHECKPOINT) {
            self.checkpoint = parse_bool(ENV_CHECKPOINT, &value)?;
        }
        Ok(())
    }

    pub fn watcher_config(&self) -> Result<WatcherConfig> {
        if !self.poll_interval_secs.is_finite() || self.poll_interval_secs <= 0.0 {
            return Err(AppError::InvalidConfig(format!(
                "poll interval must be a positive number of seconds, got {}",
                self.poll_interval_secs
            )));
        }
        let config = WatcherConfig {
            poll_interval: Duration::from_secs_f64(self.poll_interval_secs),
            critical_threshold: self.critical_threshold,
            batch_size: self.batch_size,
            checkpoint: self.checkpoint,
            consumer: self.consumer.clone(),
        };
        config
            .validate()
            .map_err(|err| AppError::InvalidConfig(err.to_string()))?;
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::InvalidConfig(format!("invalid value for {}: {}", name, value)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::InvalidConfig(format!(
            "invalid value for {}: {}",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_watcher_defaults() {
        let config = MonitorConfig::default().watcher_config().expect("config");
        assert_eq!(config, WatcherConfig::default());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MonitorConfig::default();
        config
            .apply_env(lookup(&[
                (ENV_DB_PATH, "/tmp/monitor.sqlite"),
                (ENV_PORT, "9100"),
                (ENV_POLL_INTERVAL, "0.5"),
                (ENV_CRITICAL_THRESHOLD, "0.75"),
                (ENV_CHECKPOINT, "off"),
            ]))
            .expect("apply env");

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/monitor.sqlite")));
        assert_eq!(config.port, 9100);
        let watcher = config.watcher_config().expect("watcher config");
        assert_eq!(watcher.poll_interval, Duration::from_millis(500));
        assert_eq!(watcher.critical_threshold, 0.75);
        assert!(!watcher.checkpoint);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = MonitorConfig::default();
        assert!(config.apply_env(lookup(&[(ENV_PORT, "http")])).is_err());

        let config = MonitorConfig {
            critical_threshold: 1.5,
            ..MonitorConfig::default()
        };
        assert!(matches!(
            config.watcher_config(),
            Err(AppError::InvalidConfig(_))
        ));

        let config = MonitorConfig {
            poll_interval_secs: 0.0,
            ..MonitorConfig::default()
        };
        assert!(config.watcher_config().is_err());
    }
}
