//! Timing configuration for the monitor.
//!
//! The monitor keeps staleness in 100 ms units, so both the sweep period and
//! the offline timeout must be whole multiples of 100 ms, and the timeout
//! must be a whole number of sweep periods.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::MonitorError;
use nodewatch_types::OFFLINE_TIMEOUT_MS;

/// Sweep period used when none is configured.
pub const DEFAULT_TIMER_PERIOD_MS: u32 = 400;

/// Resolution of the staleness counter.
pub const TICK_MS: u32 = 100;

/// Prefix for environment overrides, e.g. `NODEWATCH_TIMER_PERIOD_MS`.
pub const ENV_PREFIX: &str = "NODEWATCH";

/// Validated timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMonitorConfig")]
pub struct MonitorConfig {
    timer_period_ms: u32,
    offline_timeout_ms: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawMonitorConfig {
    timer_period_ms: u32,
    offline_timeout_ms: u32,
}

impl Default for RawMonitorConfig {
    fn default() -> Self {
        Self {
            timer_period_ms: DEFAULT_TIMER_PERIOD_MS,
            offline_timeout_ms: OFFLINE_TIMEOUT_MS,
        }
    }
}

impl TryFrom<RawMonitorConfig> for MonitorConfig {
    type Error = MonitorError;

    fn try_from(raw: RawMonitorConfig) -> Result<Self, Self::Error> {
        Self::new(raw.timer_period_ms, raw.offline_timeout_ms)
    }
}

impl MonitorConfig {
    /// Create a configuration, checking that the two durations line up.
    pub fn new(timer_period_ms: u32, offline_timeout_ms: u32) -> Result<Self, MonitorError> {
        if timer_period_ms == 0 || timer_period_ms % TICK_MS != 0 {
            return Err(MonitorError::Config(format!(
                "timer period {}ms is not a positive multiple of {}ms",
                timer_period_ms, TICK_MS
            )));
        }
        if offline_timeout_ms == 0 || offline_timeout_ms % TICK_MS != 0 {
            return Err(MonitorError::Config(format!(
                "offline timeout {}ms is not a positive multiple of {}ms",
                offline_timeout_ms, TICK_MS
            )));
        }
        if offline_timeout_ms < timer_period_ms || offline_timeout_ms % timer_period_ms != 0 {
            return Err(MonitorError::Config(format!(
                "offline timeout {}ms is not a whole number of {}ms timer periods",
                offline_timeout_ms, timer_period_ms
            )));
        }
        Ok(Self {
            timer_period_ms,
            offline_timeout_ms,
        })
    }

    /// Load configuration from an optional file plus `NODEWATCH_*` environment
    /// variables. Missing keys fall back to the protocol defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn timer_period_ms(&self) -> u32 {
        self.timer_period_ms
    }

    pub fn offline_timeout_ms(&self) -> u32 {
        self.offline_timeout_ms
    }

    /// Sweep period as a [`Duration`], for arming timers.
    pub fn timer_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.timer_period_ms))
    }

    /// Sweep period in staleness units.
    pub(crate) fn period_ms100(&self) -> i32 {
        (self.timer_period_ms / TICK_MS) as i32
    }

    /// Offline threshold in staleness units.
    pub(crate) fn offline_timeout_ms100(&self) -> i32 {
        (self.offline_timeout_ms / TICK_MS) as i32
    }

    /// Number of silent sweeps after which a node goes offline.
    pub fn sweeps_to_offline(&self) -> u32 {
        self.offline_timeout_ms / self.timer_period_ms
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            timer_period_ms: DEFAULT_TIMER_PERIOD_MS,
            offline_timeout_ms: OFFLINE_TIMEOUT_MS,
        }
    }
}
