//! Frame type representing one captured image.

use chrono::{DateTime, Utc};

/// A single encoded frame pulled from the sensor.
///
/// The payload is opaque to this crate (already-compressed image bytes).
/// Whoever holds the `Frame` owns the buffer; dropping it releases the
/// underlying storage.
#[derive(Clone)]
pub struct Frame {
    /// Encoded image bytes.
    bytes: Vec<u8>,
    /// Wall-clock capture time.
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Creates a frame from encoded bytes, timestamped now.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self::with_timestamp(bytes, Utc::now())
    }

    /// Creates a frame with an explicit capture timestamp.
    pub fn with_timestamp(bytes: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        Self { bytes, captured_at }
    }

    /// Returns a reference to the encoded payload.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Consumes the frame, returning the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.bytes.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
