//! Continuous frame delivery to a chunked transport.
//!
//! The stream controller is the one long-lived consumer of the sensor
//! arbiter. It holds the lock only for the duration of each single-frame
//! pull, so snapshot and motion-capture requests interleave between
//! frames instead of starving for a whole session.

mod controller;
mod sink;

pub use controller::{StreamController, StreamError, STREAM_CONTENT_TYPE, STREAM_RESOLUTION};
pub use sink::{ChunkSink, CollectSink, WriterSink};
