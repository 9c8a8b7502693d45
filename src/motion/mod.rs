//! Motion-triggered capture feeding the snapshot archive.
//!
//! The motion-event source (PIR sensor, frame differencing, whatever the
//! deployment uses) lives outside the crate; it calls [`MotionMonitor::on_motion`]
//! with a wall-clock timestamp and this module does the rest: one capture
//! through the arbiter at the sensor's configured settings, then an
//! archive push after the arbiter is released.

use crate::arbiter::SensorArbiter;
use crate::archive::SnapshotArchive;
use crate::sensor::SensorError;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The single producer path into the snapshot archive.
pub struct MotionMonitor {
    arbiter: Arc<SensorArbiter>,
    archive: Arc<SnapshotArchive>,
    events: AtomicU64,
}

impl MotionMonitor {
    /// Creates a monitor over the shared arbiter and archive.
    pub fn new(arbiter: Arc<SensorArbiter>, archive: Arc<SnapshotArchive>) -> Self {
        Self {
            arbiter,
            archive,
            events: AtomicU64::new(0),
        }
    }

    /// Handles one motion event: capture a frame and archive it.
    ///
    /// Returns the archived record's sequence number, or `None` if the
    /// frame exceeded the per-record byte budget. An oversized frame is
    /// dropped with a warning; stored history is never evicted to make
    /// room for it. Capture failures propagate to the caller.
    pub fn on_motion(&self, at: DateTime<Utc>) -> Result<Option<u64>, SensorError> {
        let events = self.events.fetch_add(1, Ordering::Relaxed) + 1;

        let frame = {
            let mut sensor = self.arbiter.lock();
            sensor.acquire()?
        };

        // The arbiter is released before touching the archive; archive
        // writes never hold the camera lock.
        match self.archive.push(frame.into_bytes(), at) {
            Ok(sequence) => {
                tracing::info!(events, sequence, "motion capture archived");
                Ok(Some(sequence))
            }
            Err(err) => {
                tracing::warn!(events, error = %err, "motion capture dropped");
                Ok(None)
            }
        }
    }

    /// Returns the number of motion events handled since startup,
    /// including those whose frames were dropped.
    pub fn events(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MotionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionMonitor")
            .field("events", &self.events())
            .finish()
    }
}
