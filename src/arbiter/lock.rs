//! The sensor lock itself.

use crate::sensor::FrameSource;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutual-exclusion arbiter owning the one sensor handle.
///
/// `lock` blocks until no other context holds the sensor, then grants
/// exclusive ownership for the lifetime of the returned guard. There is
/// no fairness guarantee beyond what the platform mutex provides, and no
/// acquisition timeout: a wedged sensor driver stalls every camera path,
/// which is accepted here and left to watchdog-level recovery outside the
/// crate.
pub struct SensorArbiter {
    sensor: Mutex<Box<dyn FrameSource>>,
}

impl SensorArbiter {
    /// Wraps the sensor handle. Called once at startup; the handle is
    /// never duplicated afterwards.
    pub fn new(sensor: Box<dyn FrameSource>) -> Self {
        Self {
            sensor: Mutex::new(sensor),
        }
    }

    /// Blocks until the sensor is available, then returns an exclusive
    /// guard.
    ///
    /// A poisoned lock is recovered rather than propagated: the sensor
    /// handle holds no torn state a panicked holder could leave behind
    /// (configuration is applied as an atomic pair), and wedging every
    /// camera path permanently would be worse than continuing.
    pub fn lock(&self) -> SensorGuard<'_> {
        SensorGuard {
            inner: self.sensor.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

impl std::fmt::Debug for SensorArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorArbiter").finish_non_exhaustive()
    }
}

/// Exclusive ownership of the sensor, released on drop.
pub struct SensorGuard<'a> {
    inner: MutexGuard<'a, Box<dyn FrameSource>>,
}

impl Deref for SensorGuard<'_> {
    type Target = Box<dyn FrameSource>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SensorGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{MockSensor, Resolution, SensorConfig};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_exclusive_configuration_windows() {
        // Each thread applies its own configuration and verifies it is
        // still in place after a capture, all inside one guard scope. Any
        // interleaving inside the critical section would show up as a
        // torn configuration read.
        let arbiter = Arc::new(SensorArbiter::new(Box::new(MockSensor::new())));
        let original = arbiter.lock().config();

        let mut handles = Vec::new();
        for quality in [20u8, 30, 40, 50] {
            let arbiter = Arc::clone(&arbiter);
            handles.push(thread::spawn(move || {
                for _ in 0..25 {
                    let mut sensor = arbiter.lock();
                    let saved = sensor.config();
                    let mine = SensorConfig::new(Resolution::Vga, quality);
                    sensor.apply_config(&mine).unwrap();
                    let frame = sensor.acquire().unwrap();
                    assert_eq!(sensor.config(), mine);
                    assert_eq!(frame.len(), MockSensor::frame_len(&mine));
                    sensor.apply_config(&saved).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(arbiter.lock().config(), original);
    }

    #[test]
    fn test_poisoned_lock_recovers() {
        let arbiter = Arc::new(SensorArbiter::new(Box::new(MockSensor::new())));

        let poisoner = Arc::clone(&arbiter);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("poison the sensor lock");
        })
        .join();

        // The sensor must still be usable.
        let mut sensor = arbiter.lock();
        assert!(sensor.acquire().is_ok());
    }
}
