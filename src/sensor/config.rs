//! Sensor operating configuration.
//!
//! The sensor exposes exactly two knobs the service touches at runtime: a
//! resolution size class and a JPEG compression level. The pair is always
//! read and applied together so no caller ever observes a half-applied
//! transition.

use serde::{Deserialize, Serialize};

/// Best (least compressed) JPEG quality value the sensor accepts.
pub const QUALITY_BEST: u8 = 10;

/// Most compressed JPEG quality value the sensor accepts.
pub const QUALITY_SMALLEST: u8 = 63;

/// Sensor resolution size classes, ordered smallest to largest.
///
/// The `Ord` impl follows pixel count, which lets policy code clamp a
/// requested resolution with plain `min`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// 160x120.
    Qqvga,
    /// 320x240. The safe default for constrained devices.
    Qvga,
    /// 640x480.
    Vga,
    /// 800x600.
    Svga,
    /// 1024x768.
    Xga,
    /// 1600x1200.
    Uxga,
}

impl Resolution {
    /// Returns the frame dimensions as (width, height).
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Qqvga => (160, 120),
            Resolution::Qvga => (320, 240),
            Resolution::Vga => (640, 480),
            Resolution::Svga => (800, 600),
            Resolution::Xga => (1024, 768),
            Resolution::Uxga => (1600, 1200),
        }
    }

    /// Returns the total pixel count for this size class.
    pub fn pixel_count(self) -> u32 {
        let (w, h) = self.dimensions();
        w * h
    }
}

/// The sensor's operating mode: resolution plus JPEG compression level.
///
/// Quality follows the sensor's native convention: **lower numbers mean
/// better quality and larger frames** (10 best, 63 most compressed).
/// Mutated only while holding the sensor arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Resolution size class.
    pub resolution: Resolution,
    /// JPEG compression level, valid 10..=63, higher = more compression.
    pub quality: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Qvga,
            quality: 30,
        }
    }
}

impl SensorConfig {
    /// Creates a configuration with the given resolution and quality.
    pub fn new(resolution: Resolution, quality: u8) -> Self {
        Self {
            resolution,
            quality,
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality < QUALITY_BEST || self.quality > QUALITY_SMALLEST {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Quality value outside the sensor's accepted range.
    #[error("jpeg quality {0} out of range ({QUALITY_BEST}..={QUALITY_SMALLEST})")]
    InvalidQuality(u8),
}
