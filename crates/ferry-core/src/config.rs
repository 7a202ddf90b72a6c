use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

pub const ENV_MAX_WORKERS: &str = "FERRY_MAX_WORKERS";
pub const ENV_POLL_INTERVAL_MS: &str = "FERRY_POLL_INTERVAL_MS";

/// Dispatcher and worker pool settings.
///
/// Too few workers and the queue builds up; too many and the node spends its
/// time context switching. The pool size is fixed for the dispatcher's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Hard ceiling on concurrently executing uploads.
    pub max_workers: usize,

    /// Idle delay between drain cycles once the queue is empty.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
}

impl DispatcherConfig {
    pub fn new(max_workers: usize, poll_interval: Duration) -> Self {
        Self {
            max_workers,
            poll_interval,
        }
    }

    /// Load from `FERRY_MAX_WORKERS` / `FERRY_POLL_INTERVAL_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(workers) = parse_env(ENV_MAX_WORKERS)? {
            config.max_workers = workers;
        }
        if let Some(ms) = parse_env::<u64>(ENV_POLL_INTERVAL_MS)? {
            config.poll_interval = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
