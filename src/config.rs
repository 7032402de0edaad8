//! Session configuration.
//!
//! Settings are fixed for the lifetime of a session. Everything that can
//! change while a session runs (surface size, display rotation, device
//! tilt) goes through session commands instead.

use crate::geometry::{Facing, Rotation};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a camera session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name given to the hardware worker thread.
    pub worker_name: String,
    /// Facing of the camera opened first.
    pub preferred_facing: Facing,
    /// Display rotation in effect until the caller reports another one.
    pub display_rotation: Rotation,
    /// JPEG quality requested from devices that encode JPEG (1-100).
    pub jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            worker_name: "camera-worker".to_string(),
            preferred_facing: Facing::Back,
            display_rotation: Rotation::Deg0,
            jpeg_quality: 100,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration that opens the given facing first.
    pub fn with_facing(facing: Facing) -> Self {
        Self {
            preferred_facing: facing,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_name.trim().is_empty() {
            return Err(ConfigError::InvalidWorkerName);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Worker thread name is blank.
    #[error("worker thread name must not be empty")]
    InvalidWorkerName,
    /// JPEG quality outside `1..=100`.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidJpegQuality(u8),
    /// Demo surface has a zero dimension.
    #[error("invalid surface dimensions")]
    InvalidSurface,
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Demo binary settings.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Settings for the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated preview surface width.
    pub surface_width: u32,
    /// Simulated preview surface height.
    pub surface_height: u32,
    /// Number of stills to capture.
    pub captures: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            surface_width: 1080,
            surface_height: 1920,
            captures: 3,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.session.validate()?;
        if config.demo.surface_width == 0 || config.demo.surface_height == 0 {
            return Err(ConfigError::InvalidSurface);
        }
        Ok(config)
    }
}
