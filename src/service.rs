//! The camera service facade.
//!
//! Wires the arbiter, archive, stream controller, and motion monitor
//! around one sensor handle and exposes the operations collaborators
//! (request handlers, schedulers, telemetry publishers) call.

use crate::arbiter::{snapshot_config, ScopedConfig, SensorArbiter};
use crate::archive::{SnapshotArchive, MAX_CAPACITY};
use crate::motion::MotionMonitor;
use crate::sensor::{Frame, FrameSource, Resolution, SensorError};
use crate::settings::Settings;
use crate::stream::{ChunkSink, StreamController, StreamError};
use std::sync::Arc;

/// One camera, many consumers.
///
/// Created once at process start with the sensor handle; the handle is
/// never duplicated, every path reaches it through the shared arbiter.
pub struct CameraService {
    arbiter: Arc<SensorArbiter>,
    archive: Arc<SnapshotArchive>,
    stream: Arc<StreamController>,
    motion: MotionMonitor,
}

impl CameraService {
    /// Builds the service around a sensor handle.
    ///
    /// The sensor is switched to the configured default operating mode
    /// before any consumer can reach it.
    pub fn new(mut sensor: Box<dyn FrameSource>, settings: &Settings) -> Result<Self, SensorError> {
        sensor.apply_config(&settings.sensor)?;

        let arbiter = Arc::new(SensorArbiter::new(sensor));
        let archive = Arc::new(SnapshotArchive::new(
            MAX_CAPACITY,
            settings.archive.keep,
            settings.archive.per_snapshot_bytes,
        ));
        let stream = Arc::new(StreamController::new(
            Arc::clone(&arbiter),
            &settings.stream,
        ));
        let motion = MotionMonitor::new(Arc::clone(&arbiter), Arc::clone(&archive));

        Ok(Self {
            arbiter,
            archive,
            stream,
            motion,
        })
    }

    /// Captures one on-demand snapshot.
    ///
    /// The capture runs under a transient, policy-clamped configuration
    /// (never above the snapshot resolution ceiling or the caller's lower
    /// hint) and the sensor's configuration is identical before and after
    /// the call, even when the capture fails.
    pub fn capture_snapshot(
        &self,
        max_resolution: Option<Resolution>,
    ) -> Result<Frame, SensorError> {
        let mut scoped = ScopedConfig::apply(&self.arbiter, |current| {
            snapshot_config(current, max_resolution)
        })?;
        scoped.acquire()
    }

    /// Runs a stream session against `sink` until cancelled or failed.
    /// Blocks the calling thread for the duration of the session.
    pub fn start_stream(&self, sink: &mut dyn ChunkSink) -> Result<(), StreamError> {
        self.stream.run(sink)
    }

    /// Requests cancellation of the running stream session, if any.
    pub fn stop_stream(&self) {
        self.stream.stop();
    }

    /// Returns true while a stream session is live.
    pub fn stream_active(&self) -> bool {
        self.stream.is_active()
    }

    /// Returns the snapshot archive.
    pub fn archive(&self) -> &SnapshotArchive {
        &self.archive
    }

    /// Returns the motion-capture entry point.
    pub fn motion(&self) -> &MotionMonitor {
        &self.motion
    }

    /// Returns a shareable handle to the stream controller, for shutdown
    /// paths (signal handlers) that outlive borrows of the service.
    pub fn stream_handle(&self) -> Arc<StreamController> {
        Arc::clone(&self.stream)
    }

    /// Applies updated settings to the live service.
    ///
    /// The sensor's default operating mode changes under the arbiter;
    /// archive retention and byte budget take effect immediately, evicting
    /// excess history if the retention count shrank. Stream cadence is
    /// fixed at construction and unaffected.
    pub fn apply_settings(&self, settings: &Settings) -> Result<(), SensorError> {
        {
            let mut sensor = self.arbiter.lock();
            sensor.apply_config(&settings.sensor)?;
        }
        self.archive.set_keep_limit(settings.archive.keep);
        self.archive.set_byte_limit(settings.archive.per_snapshot_bytes);
        tracing::info!(?settings.sensor, keep = settings.archive.keep, "settings applied");
        Ok(())
    }
}

impl std::fmt::Debug for CameraService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraService")
            .field("stream_active", &self.stream_active())
            .field("archived", &self.archive.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::MIN_CAPTURE_COMPRESSION;
    use crate::sensor::{MockSensor, SensorConfig};
    use crate::stream::{CollectSink, STREAM_RESOLUTION};
    use std::thread;
    use std::time::{Duration, Instant};

    fn service_with(config: SensorConfig) -> CameraService {
        let mut settings = Settings::default();
        settings.sensor = config;
        settings.stream.frames_per_second = 50;
        settings.stream.poll_interval_ms = 1;
        CameraService::new(Box::new(MockSensor::new()), &settings).unwrap()
    }

    fn wait_until(deadline_ms: u64, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        done()
    }

    #[test]
    fn test_snapshot_uses_clamped_configuration_and_restores() {
        let configured = SensorConfig::new(Resolution::Uxga, 12);
        let service = service_with(configured);

        let frame = service.capture_snapshot(None).unwrap();
        let clamped = snapshot_config(configured, None);
        assert_eq!(frame.len(), MockSensor::frame_len(&clamped));

        // Global state untouched.
        assert_eq!(service.arbiter.lock().config(), configured);
    }

    #[test]
    fn test_snapshot_honors_resolution_hint() {
        let service = service_with(SensorConfig::new(Resolution::Uxga, 40));

        let frame = service.capture_snapshot(Some(Resolution::Qqvga)).unwrap();
        let expected = SensorConfig::new(Resolution::Qqvga, 40);
        assert_eq!(frame.len(), MockSensor::frame_len(&expected));
    }

    #[test]
    fn test_snapshot_mid_stream_leaves_session_intact() {
        let configured = SensorConfig::new(Resolution::Uxga, 12);
        let service = service_with(configured);

        let sink = CollectSink::new();
        let runner = {
            let controller = service.stream_handle();
            let mut sink = sink.clone();
            thread::spawn(move || controller.run(&mut sink))
        };
        assert!(wait_until(2000, || sink.chunk_count() >= 3));

        // Mid-stream snapshot: runs under its own transient
        // configuration, then hands the sensor back exactly as the
        // stream session had it.
        let frame = service.capture_snapshot(None).unwrap();
        let streamed = SensorConfig::new(STREAM_RESOLUTION, MIN_CAPTURE_COMPRESSION);
        let snap = snapshot_config(streamed, None);
        assert_eq!(frame.len(), MockSensor::frame_len(&snap));

        // The stream keeps delivering afterwards.
        let before = sink.chunk_count();
        assert!(wait_until(2000, || sink.chunk_count() >= before + 3));

        service.stop_stream();
        runner.join().unwrap().unwrap();

        // Session teardown restores the pre-stream configuration.
        assert_eq!(service.arbiter.lock().config(), configured);
        assert!(!service.stream_active());
    }

    #[test]
    fn test_motion_and_archive_accessors() {
        let service = service_with(SensorConfig::default());
        let at = chrono::Utc::now();

        service.motion().on_motion(at).unwrap();
        assert_eq!(service.archive().count(), 1);
        assert_eq!(service.motion().events(), 1);
        assert_eq!(service.archive().get(0).unwrap().captured_at(), at);
    }

    #[test]
    fn test_apply_settings_updates_sensor_and_archive() {
        let service = service_with(SensorConfig::default());
        for _ in 0..3 {
            service.motion().on_motion(chrono::Utc::now()).unwrap();
        }

        let mut updated = Settings::default();
        updated.sensor = SensorConfig::new(Resolution::Svga, 45);
        updated.archive.keep = 1;
        service.apply_settings(&updated).unwrap();

        assert_eq!(service.arbiter.lock().config(), updated.sensor);
        assert_eq!(service.archive().count(), 1);
        assert_eq!(service.archive().keep_limit(), 1);
    }
}
