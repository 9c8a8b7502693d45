//! Ring storage with byte-budget enforcement.

use super::SnapshotRecord;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Hard upper bound on the archive's physical capacity.
pub const MAX_CAPACITY: usize = 20;

/// Errors returned by archive operations.
#[derive(Debug, Clone, Error)]
pub enum ArchiveError {
    /// The payload exceeds the per-record byte limit. Permanent for this
    /// payload; retrying with the same bytes cannot succeed.
    #[error("snapshot of {size} bytes exceeds per-record limit of {limit} bytes")]
    CapacityRejected {
        /// Size of the rejected payload.
        size: usize,
        /// Per-record byte limit in force at rejection time.
        limit: usize,
    },
    /// No record exists at the requested index.
    #[error("no snapshot at index {0}")]
    NotFound(usize),
}

struct ArchiveInner {
    /// Fixed arena of slots; a rotating head cursor avoids shifting
    /// records on every insert.
    slots: Vec<Option<SnapshotRecord>>,
    /// Physical slot of logical index 0. Meaningful only when `len > 0`.
    head: usize,
    /// Number of live records.
    len: usize,
    /// Sum of all stored payload sizes.
    bytes_used: usize,
    /// Retention count, always within 1..=capacity.
    keep: usize,
    /// Per-record byte ceiling for future pushes.
    byte_limit: usize,
    /// Next producer-assigned sequence number.
    next_sequence: u64,
}

/// Fixed-capacity ring of timestamped snapshots, newest first.
///
/// All mutable state sits behind one internal lock, so a push (insert plus
/// any evictions) is a single atomic step: readers observe the archive
/// either entirely before or entirely after it, never in between. The lock
/// is independent of the sensor arbiter; browsing history never blocks on
/// the camera.
pub struct SnapshotArchive {
    inner: Mutex<ArchiveInner>,
}

impl SnapshotArchive {
    /// Creates an archive with the given physical capacity, retention
    /// count, and per-record byte limit.
    ///
    /// Capacity is clamped to 1..=[`MAX_CAPACITY`] and `keep` to
    /// 1..=capacity.
    pub fn new(capacity: usize, keep: usize, byte_limit: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            inner: Mutex::new(ArchiveInner {
                slots: (0..capacity).map(|_| None).collect(),
                head: capacity - 1,
                len: 0,
                bytes_used: 0,
                keep: keep.clamp(1, capacity),
                byte_limit: byte_limit.max(1),
                next_sequence: 0,
            }),
        }
    }

    /// Inserts a snapshot at logical index 0, evicting the oldest records
    /// if the retention count is exceeded. Returns the assigned sequence
    /// number.
    ///
    /// A payload larger than the per-record limit is rejected outright and
    /// the archive is left untouched; existing history is never evicted to
    /// make room for an oversized frame.
    pub fn push(&self, bytes: Vec<u8>, captured_at: DateTime<Utc>) -> Result<u64, ArchiveError> {
        let mut inner = self.lock();

        if bytes.len() > inner.byte_limit {
            return Err(ArchiveError::CapacityRejected {
                size: bytes.len(),
                limit: inner.byte_limit,
            });
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let capacity = inner.slots.len();
        inner.head = (inner.head + 1) % capacity;
        let head = inner.head;

        // When the ring is full the next slot holds the oldest record.
        if let Some(evicted) = inner.slots[head].take() {
            inner.bytes_used -= evicted.len();
            inner.len -= 1;
        }

        inner.bytes_used += bytes.len();
        inner.slots[head] = Some(SnapshotRecord::new(bytes, captured_at, sequence));
        inner.len += 1;

        while inner.len > inner.keep {
            Self::evict_oldest(&mut inner);
        }

        tracing::debug!(
            sequence,
            stored = inner.len,
            bytes_used = inner.bytes_used,
            "snapshot archived"
        );

        Ok(sequence)
    }

    /// Returns the record at logical index `n` (0 = newest).
    ///
    /// Read-only; does not affect recency order. The returned record is a
    /// cheap reference-counted handle.
    pub fn get(&self, n: usize) -> Result<SnapshotRecord, ArchiveError> {
        let inner = self.lock();
        if n >= inner.len {
            return Err(ArchiveError::NotFound(n));
        }
        let capacity = inner.slots.len();
        let physical = (inner.head + capacity - n) % capacity;
        inner.slots[physical]
            .clone()
            .ok_or(ArchiveError::NotFound(n))
    }

    /// Returns the number of stored records.
    pub fn count(&self) -> usize {
        self.lock().len
    }

    /// Returns the total bytes held by stored records.
    pub fn bytes_used(&self) -> usize {
        self.lock().bytes_used
    }

    /// Returns the per-record byte limit.
    pub fn byte_limit(&self) -> usize {
        self.lock().byte_limit
    }

    /// Returns the current retention count.
    pub fn keep_limit(&self) -> usize {
        self.lock().keep
    }

    /// Returns the physical capacity.
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }

    /// Sets the retention count, clamped to 1..=capacity, and returns the
    /// applied value.
    ///
    /// If the new limit is below the current record count the oldest
    /// excess records are evicted immediately, in the same locked step.
    pub fn set_keep_limit(&self, keep: usize) -> usize {
        let mut inner = self.lock();
        let capacity = inner.slots.len();
        inner.keep = keep.clamp(1, capacity);
        while inner.len > inner.keep {
            Self::evict_oldest(&mut inner);
        }
        tracing::info!(keep = inner.keep, stored = inner.len, "retention limit updated");
        inner.keep
    }

    /// Sets the per-record byte limit for future pushes and returns the
    /// applied value. Records already stored are unaffected.
    pub fn set_byte_limit(&self, limit: usize) -> usize {
        let mut inner = self.lock();
        inner.byte_limit = limit.max(1);
        inner.byte_limit
    }

    fn evict_oldest(inner: &mut ArchiveInner) {
        debug_assert!(inner.len > 0);
        let capacity = inner.slots.len();
        let oldest = (inner.head + capacity - (inner.len - 1)) % capacity;
        if let Some(evicted) = inner.slots[oldest].take() {
            inner.bytes_used -= evicted.len();
            inner.len -= 1;
            tracing::debug!(sequence = evicted.sequence(), "snapshot evicted");
        }
    }

    fn lock(&self) -> MutexGuard<'_, ArchiveInner> {
        // A panic cannot leave the inner state half-updated: push and
        // eviction mutate under one guard with no intervening user code.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SnapshotArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SnapshotArchive")
            .field("count", &inner.len)
            .field("capacity", &inner.slots.len())
            .field("keep", &inner.keep)
            .field("bytes_used", &inner.bytes_used)
            .finish()
    }
}
