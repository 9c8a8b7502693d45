//! Bounded, timestamped archive of recent snapshots.
//!
//! A fixed-capacity ring of immutable records addressed newest-first
//! (index 0 is the most recent capture). The archive carries its own lock,
//! independent of the sensor arbiter, so readers never need to touch the
//! camera to browse history.

mod record;
mod ring;

pub use record::SnapshotRecord;
pub use ring::{ArchiveError, SnapshotArchive, MAX_CAPACITY};
