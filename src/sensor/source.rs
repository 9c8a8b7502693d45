//! Frame-source abstraction over the physical sensor.
//!
//! This trait is the seam between the service core and the hardware
//! driver, allowing a deterministic mock to stand in for real capture
//! hardware in tests and demos.

use super::{Frame, SensorConfig};
use thiserror::Error;

/// Errors that can occur during sensor operations.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The requested configuration was rejected by the sensor.
    #[error("sensor rejected configuration: {0}")]
    ConfigRejected(#[from] super::ConfigError),
    /// The sensor returned no frame. Transient hardware condition.
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),
    /// The sensor has not been initialized.
    #[error("sensor not initialized")]
    NotInitialized,
}

/// Trait for frame-source implementations.
///
/// A frame source is pull-style: callers request one frame at a time and
/// own the returned buffer. The configuration pair is applied atomically;
/// an implementation must never leave the resolution changed while the
/// quality change failed, or vice versa.
pub trait FrameSource: Send {
    /// Returns the current operating configuration.
    fn config(&self) -> SensorConfig;

    /// Applies a new operating configuration.
    fn apply_config(&mut self, config: &SensorConfig) -> Result<(), SensorError>;

    /// Acquires the next frame.
    fn acquire(&mut self) -> Result<Frame, SensorError>;
}

/// Mock sensor that generates deterministic synthetic frames.
///
/// Frame payloads scale with resolution and shrink with compression, so
/// tests can verify which configuration a capture ran under by looking at
/// the payload size alone.
#[derive(Debug)]
pub struct MockSensor {
    config: SensorConfig,
    sequence: u64,
    fail_captures: bool,
}

impl MockSensor {
    /// Creates a mock sensor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SensorConfig::default())
    }

    /// Creates a mock sensor with an explicit starting configuration.
    pub fn with_config(config: SensorConfig) -> Self {
        Self {
            config,
            sequence: 0,
            fail_captures: false,
        }
    }

    /// Makes every subsequent `acquire` fail until cleared.
    pub fn set_failing(&mut self, fail: bool) {
        self.fail_captures = fail;
    }

    /// Returns the number of frames acquired so far.
    pub fn frames_acquired(&self) -> u64 {
        self.sequence
    }

    /// Deterministic payload size for a given configuration.
    ///
    /// Rough model of a compressed frame: pixel count divided by four
    /// times the compression level.
    pub fn frame_len(config: &SensorConfig) -> usize {
        (config.resolution.pixel_count() as usize) / (4 * config.quality as usize)
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockSensor {
    fn config(&self) -> SensorConfig {
        self.config
    }

    fn apply_config(&mut self, config: &SensorConfig) -> Result<(), SensorError> {
        config.validate()?;
        self.config = *config;
        tracing::debug!(?config, "MockSensor configuration applied");
        Ok(())
    }

    fn acquire(&mut self) -> Result<Frame, SensorError> {
        if self.fail_captures {
            return Err(SensorError::CaptureFailed("injected failure".into()));
        }

        let len = Self::frame_len(&self.config);
        // Deterministic pattern mixed with the sequence number. Not image
        // data, only a stand-in for frame handling.
        let bytes: Vec<u8> = (0..len)
            .map(|i| ((i as u64 ^ self.sequence) % 256) as u8)
            .collect();

        self.sequence += 1;
        Ok(Frame::new(bytes))
    }
}
