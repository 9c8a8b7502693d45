//! Service settings.
//!
//! The settings store itself (persistence, web form, wherever values come
//! from) is an external collaborator; this module only defines the typed
//! view the service consumes, with TOML loading for file-based deployments.

use crate::archive::MAX_CAPACITY;
use crate::sensor::{ConfigError, SensorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Snapshot archive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Number of snapshots to retain, 1..=20.
    pub keep: usize,
    /// Per-snapshot byte ceiling.
    pub per_snapshot_bytes: usize,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            keep: 8,
            per_snapshot_bytes: 128 * 1024,
        }
    }
}

/// Stream cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Target frame rate during a stream session.
    pub frames_per_second: u32,
    /// Cancellation polling granularity while waiting between frames.
    pub poll_interval_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            frames_per_second: 5,
            poll_interval_ms: 10,
        }
    }
}

/// Complete service settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Default sensor operating mode.
    #[serde(default)]
    pub sensor: SensorConfig,
    /// Archive retention and budget.
    #[serde(default)]
    pub archive: ArchiveSettings,
    /// Stream cadence.
    #[serde(default)]
    pub stream: StreamSettings,
}

/// Settings loading and validation errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file: {0}")]
    FileRead(String),
    /// The settings file is not valid TOML for this schema.
    #[error("failed to parse settings file: {0}")]
    Parse(String),
    /// The sensor configuration is out of range.
    #[error(transparent)]
    Sensor(#[from] ConfigError),
    /// The archive retention count is out of range.
    #[error("archive keep {0} out of range (1..={MAX_CAPACITY})")]
    InvalidKeep(usize),
    /// The per-snapshot byte ceiling is zero.
    #[error("per-snapshot byte limit must be non-zero")]
    ZeroByteLimit,
    /// The stream frame rate is out of range.
    #[error("stream frame rate {0} out of range (1..=60)")]
    InvalidFrameRate(u32),
}

impl Settings {
    /// Loads and validates settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SettingsError::FileRead(e.to_string()))?;
        let settings: Settings =
            toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates all settings fields.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.sensor.validate()?;
        if self.archive.keep == 0 || self.archive.keep > MAX_CAPACITY {
            return Err(SettingsError::InvalidKeep(self.archive.keep));
        }
        if self.archive.per_snapshot_bytes == 0 {
            return Err(SettingsError::ZeroByteLimit);
        }
        if self.stream.frames_per_second == 0 || self.stream.frames_per_second > 60 {
            return Err(SettingsError::InvalidFrameRate(self.stream.frames_per_second));
        }
        Ok(())
    }
}
