//! Archived snapshot records.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One stored snapshot: encoded image bytes plus capture metadata.
///
/// Records are immutable once inserted and only destroyed by eviction.
/// The payload is reference-counted, so handing a record to a reader is a
/// pointer copy; the archive can evict the record while readers still
/// hold it.
#[derive(Clone)]
pub struct SnapshotRecord {
    bytes: Arc<[u8]>,
    captured_at: DateTime<Utc>,
    sequence: u64,
}

impl SnapshotRecord {
    pub(super) fn new(bytes: Vec<u8>, captured_at: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            bytes: bytes.into(),
            captured_at,
            sequence,
        }
    }

    /// Returns the encoded image bytes.
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

    /// Returns the wall-clock capture time.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns the producer-assigned sequence number.
    ///
    /// Sequence numbers increase monotonically across the life of the
    /// archive and survive eviction, so collaborators can tell whether a
    /// record at index 0 is new since they last looked.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Debug for SnapshotRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotRecord")
            .field("len", &self.bytes.len())
            .field("captured_at", &self.captured_at)
            .field("sequence", &self.sequence)
            .finish()
    }
}
