//! The streaming control loop.

use super::ChunkSink;
use crate::arbiter::{SensorArbiter, MIN_CAPTURE_COMPRESSION};
use crate::sensor::{Frame, Resolution, SensorConfig, SensorError};
use crate::settings::StreamSettings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Content type a transport should advertise for the chunk sequence the
/// controller produces.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace;boundary=frame";

/// Resolution forced for the duration of a stream session. Streaming at
/// user-configured high resolutions is the fastest way to exhaust memory
/// on a constrained device.
pub const STREAM_RESOLUTION: Resolution = Resolution::Qvga;

const BOUNDARY: &[u8] = b"\r\n--frame\r\n";

/// Errors that end (or refuse) a stream session.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A session is already live. Only one stream may run system-wide.
    #[error("a stream session is already active")]
    AlreadyStreaming,
    /// The sensor failed during the session. The session is not
    /// resumable; the client must reconnect.
    #[error("stream capture failed: {0}")]
    Capture(#[from] SensorError),
    /// The sink refused a chunk, typically a disconnected client.
    #[error("stream sink failed: {0}")]
    Sink(#[from] std::io::Error),
}

/// Cancellable control loop delivering frames to a [`ChunkSink`] at a
/// fixed cadence.
///
/// The active flag is both the cancellation signal and the single-session
/// admission gate: `run` refuses to start while a session is live, so a
/// second concurrent request can never run a second loop against the same
/// sensor.
pub struct StreamController {
    arbiter: Arc<SensorArbiter>,
    active: AtomicBool,
    frame_interval: Duration,
    poll_interval: Duration,
}

impl StreamController {
    /// Creates a controller over the shared sensor arbiter.
    pub fn new(arbiter: Arc<SensorArbiter>, settings: &StreamSettings) -> Self {
        Self {
            arbiter,
            active: AtomicBool::new(false),
            frame_interval: Duration::from_millis(1000 / u64::from(settings.frames_per_second.max(1))),
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
        }
    }

    /// Runs one stream session until cancelled or failed.
    ///
    /// Applies a throughput-oriented sensor configuration for the whole
    /// session and restores the original configuration on exit, success
    /// or not. Between frames the loop sleeps in short poll ticks and
    /// re-checks the active flag, so cancellation latency is bounded by
    /// the poll interval, not the frame cadence.
    pub fn run(&self, sink: &mut dyn ChunkSink) -> Result<(), StreamError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StreamError::AlreadyStreaming);
        }

        // Starting: save the caller-visible configuration and throttle
        // the sensor for the session. Restore is deferred to Stopping,
        // not done per frame.
        let saved = {
            let mut sensor = self.arbiter.lock();
            let saved = sensor.config();
            let throttled = SensorConfig {
                resolution: STREAM_RESOLUTION,
                quality: saved.quality.max(MIN_CAPTURE_COMPRESSION),
            };
            if let Err(err) = sensor.apply_config(&throttled) {
                drop(sensor);
                self.active.store(false, Ordering::SeqCst);
                return Err(StreamError::Capture(err));
            }
            saved
        };

        tracing::info!(
            resolution = ?STREAM_RESOLUTION,
            interval_ms = self.frame_interval.as_millis() as u64,
            "stream session started"
        );

        let mut last_frame: Option<Instant> = None;
        let mut frames = 0u64;
        let mut outcome = Ok(());

        while self.active.load(Ordering::SeqCst) {
            if let Some(at) = last_frame {
                if at.elapsed() < self.frame_interval {
                    thread::sleep(self.poll_interval);
                    continue;
                }
            }
            last_frame = Some(Instant::now());

            // The arbiter is held for one pull and the emit, then
            // released, so snapshot requests slot in between frames.
            let mut sensor = self.arbiter.lock();
            let frame = match sensor.acquire() {
                Ok(frame) => frame,
                Err(err) => {
                    outcome = Err(StreamError::Capture(err));
                    break;
                }
            };
            let emitted = Self::emit(sink, &frame);
            drop(sensor);

            match emitted {
                Ok(()) => frames += 1,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        // Stopping: unconditional, whatever ended the loop.
        {
            let mut sensor = self.arbiter.lock();
            if let Err(err) = sensor.apply_config(&saved) {
                tracing::warn!(error = %err, "failed to restore pre-stream sensor configuration");
            }
        }
        self.active.store(false, Ordering::SeqCst);
        if let Err(err) = sink.write_chunk(&[]) {
            tracing::debug!(error = %err, "terminating chunk not delivered");
        }

        match &outcome {
            Ok(()) => tracing::info!(frames, "stream session ended"),
            Err(err) => tracing::warn!(frames, error = %err, "stream session aborted"),
        }
        outcome
    }

    /// Requests cancellation of the running session. Safe to call from
    /// any thread, including when no session is live.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Returns true while a session is live.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn emit(sink: &mut dyn ChunkSink, frame: &Frame) -> Result<(), StreamError> {
        sink.write_chunk(BOUNDARY)?;
        let header = format!(
            "Content-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
            frame.len()
        );
        sink.write_chunk(header.as_bytes())?;
        sink.write_chunk(frame.bytes())?;
        Ok(())
    }
}

impl std::fmt::Debug for StreamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamController")
            .field("active", &self.is_active())
            .field("frame_interval", &self.frame_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{MockSensor, SensorConfig};
    use crate::stream::CollectSink;
    use std::io;

    fn fast_settings() -> StreamSettings {
        StreamSettings {
            frames_per_second: 50,
            poll_interval_ms: 1,
        }
    }

    fn controller_with(config: SensorConfig) -> (Arc<SensorArbiter>, Arc<StreamController>) {
        let arbiter = Arc::new(SensorArbiter::new(Box::new(MockSensor::with_config(config))));
        let controller = Arc::new(StreamController::new(Arc::clone(&arbiter), &fast_settings()));
        (arbiter, controller)
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
    fn test_session_delivers_frames_and_terminating_chunk() {
        let original = SensorConfig::new(Resolution::Uxga, 12);
        let (arbiter, controller) = controller_with(original);

        let sink = CollectSink::new();
        let runner = {
            let controller = Arc::clone(&controller);
            let mut sink = sink.clone();
            thread::spawn(move || controller.run(&mut sink))
        };

        // At least two full frame triplets.
        assert!(wait_until(2000, || sink.chunk_count() >= 6));
        controller.stop();
        runner.join().unwrap().unwrap();

        let chunks = sink.chunks();
        assert!(chunks.last().unwrap().is_empty());
        assert_eq!(chunks[0], BOUNDARY);
        let header = String::from_utf8(chunks[1].clone()).unwrap();
        assert!(header.starts_with("Content-Type: image/jpeg\r\nContent-Length: "));
        assert!(header.ends_with("\r\n\r\n"));

        // Payload length matches the advertised Content-Length.
        let advertised: usize = header
            .trim_end()
            .rsplit(' ')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(chunks[2].len(), advertised);

        // The session streamed throttled frames but restored the
        // caller-visible configuration afterwards.
        let streamed = SensorConfig::new(STREAM_RESOLUTION, 30);
        assert_eq!(chunks[2].len(), MockSensor::frame_len(&streamed));
        assert_eq!(arbiter.lock().config(), original);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_second_session_refused_while_active() {
        let (_arbiter, controller) = controller_with(SensorConfig::default());

        let sink = CollectSink::new();
        let runner = {
            let controller = Arc::clone(&controller);
            let mut sink = sink.clone();
            thread::spawn(move || controller.run(&mut sink))
        };
        assert!(wait_until(1000, || controller.is_active()));

        let mut second_sink = CollectSink::new();
        assert!(matches!(
            controller.run(&mut second_sink),
            Err(StreamError::AlreadyStreaming)
        ));
        assert_eq!(second_sink.chunk_count(), 0);

        controller.stop();
        runner.join().unwrap().unwrap();
    }

    #[test]
    fn test_capture_failure_ends_session_with_restore() {
        let original = SensorConfig::new(Resolution::Svga, 25);
        let mut sensor = MockSensor::with_config(original);
        sensor.set_failing(true);
        let arbiter = Arc::new(SensorArbiter::new(Box::new(sensor)));
        let controller = StreamController::new(Arc::clone(&arbiter), &fast_settings());

        let mut sink = CollectSink::new();
        let result = controller.run(&mut sink);

        assert!(matches!(result, Err(StreamError::Capture(_))));
        assert!(!controller.is_active());
        assert_eq!(arbiter.lock().config(), original);
        // Only the terminating empty chunk made it out.
        let chunks = sink.chunks();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }

    #[test]
    fn test_sink_failure_ends_session_with_restore() {
        struct FailingSink;
        impl ChunkSink for FailingSink {
            fn write_chunk(&mut self, _chunk: &[u8]) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "client gone"))
            }
        }

        let original = SensorConfig::new(Resolution::Vga, 20);
        let (arbiter, controller) = controller_with(original);

        let result = controller.run(&mut FailingSink);
        assert!(matches!(result, Err(StreamError::Sink(_))));
        assert!(!controller.is_active());
        assert_eq!(arbiter.lock().config(), original);
    }

    #[test]
    fn test_stop_observed_during_yield_wait() {
        // Slow cadence, fast polling: cancellation must come from the
        // yield path, not the next frame boundary.
        let settings = StreamSettings {
            frames_per_second: 2,
            poll_interval_ms: 1,
        };
        let arbiter = Arc::new(SensorArbiter::new(Box::new(MockSensor::new())));
        let controller = Arc::new(StreamController::new(Arc::clone(&arbiter), &settings));

        let sink = CollectSink::new();
        let runner = {
            let controller = Arc::clone(&controller);
            let mut sink = sink.clone();
            thread::spawn(move || controller.run(&mut sink))
        };

        // First frame is emitted immediately; then the loop is parked in
        // its 500 ms inter-frame wait.
        assert!(wait_until(1000, || sink.chunk_count() >= 3));
        let stopped_at = Instant::now();
        controller.stop();
        runner.join().unwrap().unwrap();

        assert!(stopped_at.elapsed() < Duration::from_millis(250));
        assert!(sink.chunks().last().unwrap().is_empty());
        assert!(!controller.is_active());
    }
}
