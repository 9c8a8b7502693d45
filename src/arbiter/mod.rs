//! Exclusive access arbitration for the single physical sensor.
//!
//! Every path that touches the sensor (snapshot, stream, motion capture)
//! goes through [`SensorArbiter`], which guarantees at most one in-flight
//! configure/acquire sequence at any time. [`ScopedConfig`] layers the
//! recurring save/apply/restore pattern on top of the lock so temporary
//! configuration changes can never leak into other callers.

mod lock;
mod scoped;

pub use lock::{SensorArbiter, SensorGuard};
pub use scoped::{snapshot_config, ScopedConfig, MIN_CAPTURE_COMPRESSION, SNAPSHOT_RESOLUTION_CEILING};
