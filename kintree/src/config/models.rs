//! Configuration data models

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KintreeConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Tree layout geometry
    pub layout: LayoutConfig,

    /// Change-feed tuning
    pub feed: FeedConfig,
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level to emit
    pub level: LogLevel,

    /// Output format
    pub format: LogFormat,

    /// Whether to log to stdout
    pub stdout: bool,

    /// Optional log file path
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            stdout: true,
            file: None,
        }
    }
}

/// Geometry constants for the generational tree layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal slot width per node
    pub node_width: f32,

    /// Vertical distance between generations
    pub level_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            level_height: 140.0,
        }
    }
}

/// Change-feed tuning knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    /// Broadcast channel capacity between the store and the feed adapter
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

impl KintreeConfig {
    /// Validate cross-field constraints.
    pub fn validate(&self) -> super::Result<()> {
        if self.layout.node_width <= 0.0 {
            return Err(super::ConfigError::ValidationError(
                "layout.node_width must be positive".to_string(),
            ));
        }
        if self.layout.level_height <= 0.0 {
            return Err(super::ConfigError::ValidationError(
                "layout.level_height must be positive".to_string(),
            ));
        }
        if self.feed.channel_capacity == 0 {
            return Err(super::ConfigError::ValidationError(
                "feed.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
