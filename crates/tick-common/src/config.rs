//! Configuration for the pulser/worker simulation.
//!
//! The clock itself takes no configuration. These structures only describe
//! how a simulation drives it, and support TOML deserialization with
//! defaults matching a quick local run.

use crate::error::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of consumer threads.
    pub workers: usize,

    /// Ticks each worker waits for before finishing.
    pub ticks_per_worker: u64,

    /// Extra pulses emitted beyond `ticks_per_worker` so slow workers still finish.
    pub surplus_ticks: u64,

    /// Delay between pulses.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Simulated work each worker performs after observing a tick.
    #[serde(with = "humantime_serde")]
    pub work_delay: Duration,

    /// Report output configuration.
    pub report: ReportConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            ticks_per_worker: 20,
            surplus_ticks: 5,
            tick_interval: Duration::from_millis(50),
            work_delay: Duration::from_millis(1),
            report: ReportConfig::default(),
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable summary lines.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format.
    pub format: ReportFormat,
    /// Include one line per worker in text output.
    pub per_worker: bool,
}

impl SimulationConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, bytes = content.len(), "Read simulation config");
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Total pulses the simulation's producer emits.
    #[must_use]
    pub fn total_pulses(&self) -> u64 {
        self.ticks_per_worker.saturating_add(self.surplus_ticks)
    }

    /// Reject configurations that could never complete.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Config`] describing the first offending field.
    pub fn validate(&self) -> ClockResult<()> {
        if self.workers == 0 {
            return Err(ClockError::Config("workers must be at least 1".into()));
        }
        if self.ticks_per_worker == 0 {
            return Err(ClockError::Config(
                "ticks_per_worker must be at least 1".into(),
            ));
        }
        if self.tick_interval.is_zero() {
            return Err(ClockError::Config("tick_interval must be non-zero".into()));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
