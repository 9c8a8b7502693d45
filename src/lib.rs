//! Perchcam Camera Service Core
//!
//! Operates a single physical image sensor on a memory-constrained device
//! and exposes it to multiple concurrent consumers: on-demand snapshots,
//! a continuous live stream, and motion-triggered captures kept in a
//! bounded, timestamped archive.
//!
//! # Architecture
//!
//! ```text
//!          snapshot      stream      motion
//!              \            |           /
//!               +--- sensor arbiter ---+     (one lock, one sensor)
//!                          |
//!                     frame source           archive (own lock)
//! ```
//!
//! # Design Principles
//!
//! - **One sensor, one arbiter**: every configure/acquire sequence runs
//!   under a single mutual-exclusion lock; no caller ever observes a
//!   frame captured under another caller's configuration.
//! - **Transient configuration never leaks**: temporary resolution and
//!   quality changes are restored on every exit path, including errors.
//! - **Bounded memory**: the archive enforces a per-record byte ceiling
//!   and a retention count; oversized frames are dropped, and history is
//!   never evicted to make room for them.
//! - **Cooperative cancellation**: the stream loop polls a shared flag
//!   between frames; stopping it takes at most one poll interval.
//!
//! # Example
//!
//! ```no_run
//! use perchcam::{CameraService, MockSensor, Resolution, Settings};
//!
//! let settings = Settings::default();
//! let service = CameraService::new(Box::new(MockSensor::new()), &settings).unwrap();
//!
//! // On-demand snapshot, clamped to a safe resolution.
//! let frame = service.capture_snapshot(Some(Resolution::Vga)).unwrap();
//! println!("captured {} bytes", frame.len());
//!
//! // Motion event: capture and archive.
//! service.motion().on_motion(chrono::Utc::now()).unwrap();
//! let latest = service.archive().get(0).unwrap();
//! println!("archived {} bytes at {}", latest.len(), latest.captured_at());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod arbiter;
pub mod archive;
pub mod motion;
pub mod sensor;
mod service;
pub mod settings;
pub mod stream;

// Re-export commonly used types at crate root
pub use arbiter::{ScopedConfig, SensorArbiter};
pub use archive::{ArchiveError, SnapshotArchive, SnapshotRecord};
pub use motion::MotionMonitor;
pub use sensor::{Frame, FrameSource, MockSensor, Resolution, SensorConfig, SensorError};
pub use service::CameraService;
pub use settings::{Settings, SettingsError};
pub use stream::{ChunkSink, CollectSink, StreamController, StreamError, WriterSink};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
