use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::processing::markup::DisplaySettings;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "wordweave.json";

/// Application configuration
/// Loaded from a JSON file; every field falls back to its default when
/// missing so that partial files stay valid.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Page-wide ratio of words to replace
    #[serde(default = "default_replacement_rate")]
    pub replacement_rate: f64,

    /// Segments processed concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Presentation of written replacements
    #[serde(default)]
    pub display: DisplaySettings,

    /// Lifetime of the "just applied" pulse on translation spans
    #[serde(default = "default_pulse_duration_ms")]
    pub pulse_duration_ms: u64,

    /// Smoothing factor of the average processing time
    #[serde(default = "default_stats_smoothing")]
    pub stats_smoothing: f64,

    /// Whether the pronunciation collaborator is invoked
    #[serde(default = "default_true")]
    pub pronunciation_enabled: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_replacement_rate() -> f64 {
    0.3
}

fn default_batch_size() -> usize {
    8
}

fn default_pulse_duration_ms() -> u64 {
    1500
}

fn default_stats_smoothing() -> f64 {
    0.2
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Parse a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).context("Failed to parse configuration JSON")?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.replacement_rate.is_finite() || self.replacement_rate <= 0.0 || self.replacement_rate > 1.0 {
            return Err(anyhow!(
                "replacement_rate must be in (0, 1], got {}",
                self.replacement_rate
            ));
        }

        if self.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }

        if !self.stats_smoothing.is_finite() || self.stats_smoothing <= 0.0 || self.stats_smoothing > 1.0 {
            return Err(anyhow!(
                "stats_smoothing must be in (0, 1], got {}",
                self.stats_smoothing
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            replacement_rate: default_replacement_rate(),
            batch_size: default_batch_size(),
            display: DisplaySettings::default(),
            pulse_duration_ms: default_pulse_duration_ms(),
            stats_smoothing: default_stats_smoothing(),
            pronunciation_enabled: true,
            log_level: LogLevel::default(),
        }
    }
}
