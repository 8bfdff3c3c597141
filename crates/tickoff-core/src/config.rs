//! Auto-complete configuration, read from the environment.
//!
//! | key                            | unit    | default |
//! |--------------------------------|---------|---------|
//! | `AUTO_COMPLETE_DELAY`          | minutes | 10      |
//! | `AUTO_COMPLETE_DELAY_SECS`     | seconds | (unset) |
//! | `AUTO_COMPLETE_WORKERS`        | count   | 5       |
//! | `AUTO_COMPLETE_QUEUE_CAPACITY` | jobs    | 100     |
//! | `AUTO_COMPLETE_MAX_IN_FLIGHT`  | jobs    | 1024    |
//!
//! `AUTO_COMPLETE_DELAY_SECS` wins over `AUTO_COMPLETE_DELAY` when both are
//! set. Unparsable values fall back to the default with a warning; zero
//! counts are rejected.

use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::app::worker_pool::DEFAULT_MAX_IN_FLIGHT;
use crate::error::ConfigError;
use crate::queue::DEFAULT_CAPACITY;

pub const DELAY_MINUTES_KEY: &str = "AUTO_COMPLETE_DELAY";
pub const DELAY_SECS_KEY: &str = "AUTO_COMPLETE_DELAY_SECS";
pub const WORKERS_KEY: &str = "AUTO_COMPLETE_WORKERS";
pub const QUEUE_CAPACITY_KEY: &str = "AUTO_COMPLETE_QUEUE_CAPACITY";
pub const MAX_IN_FLIGHT_KEY: &str = "AUTO_COMPLETE_MAX_IN_FLIGHT";

const DEFAULT_DELAY_MINUTES: u64 = 10;
const DEFAULT_WORKERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCompleteConfig {
    pub delay: Duration,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub max_in_flight: usize,
}

impl Default for AutoCompleteConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(DEFAULT_DELAY_MINUTES * 60),
            worker_count: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl AutoCompleteConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let delay = match parse::<u64, _>(&lookup, DELAY_SECS_KEY) {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(
                parse(&lookup, DELAY_MINUTES_KEY).unwrap_or(DEFAULT_DELAY_MINUTES) * 60,
            ),
        };

        let config = Self {
            delay,
            worker_count: parse(&lookup, WORKERS_KEY).unwrap_or(defaults.worker_count),
            queue_capacity: parse(&lookup, QUEUE_CAPACITY_KEY).unwrap_or(defaults.queue_capacity),
            max_in_flight: parse(&lookup, MAX_IN_FLIGHT_KEY).unwrap_or(defaults.max_in_flight),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            (WORKERS_KEY, self.worker_count),
            (QUEUE_CAPACITY_KEY, self.queue_capacity),
            (MAX_IN_FLIGHT_KEY, self.max_in_flight),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange { key, value });
            }
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).filter(|v| !v.trim().is_empty());
    let Some(raw) = raw else {
        debug!(key, "not set, using default");
        return None;
    };
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "invalid value, using default");
            None
        }
    }
}
