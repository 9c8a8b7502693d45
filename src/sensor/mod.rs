//! Sensor configuration, frame handling, and the frame-source abstraction.
//!
//! This module treats the physical image sensor as an external collaborator:
//! the rest of the crate only requests configuration changes and pulls
//! frames through the [`FrameSource`] trait. Hardware bring-up (pin
//! mapping, driver initialization) lives outside the crate.

mod config;
mod frame;
mod source;

pub use config::{ConfigError, Resolution, SensorConfig, QUALITY_BEST, QUALITY_SMALLEST};
pub use frame::Frame;
pub use source::{FrameSource, MockSensor, SensorError};
